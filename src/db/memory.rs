use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    db::PaymentEventStore,
    domain::{PaymentEvent, PaymentEventStatus},
    errors::AppError,
};

#[derive(Clone, Default)]
pub struct MemoryPaymentEventStore {
    events: Arc<RwLock<Vec<PaymentEvent>>>,
    delete_rounds: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryPaymentEventStore {
    pub async fn insert(&self, event: PaymentEvent) {
        self.events.write().await.push(event);
    }

    pub async fn ids(&self) -> Vec<String> {
        self.events
            .read()
            .await
            .iter()
            .map(|event| event.id.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of `delete_ids` calls that reached the store.
    pub fn delete_rounds(&self) -> usize {
        self.delete_rounds.load(Ordering::SeqCst)
    }

    /// While set, every store call fails with `AppError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("memory store offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentEventStore for MemoryPaymentEventStore {
    async fn expired_ids(
        &self,
        status: PaymentEventStatus,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, AppError> {
        self.check_available()?;

        let mut matching = self
            .events
            .read()
            .await
            .iter()
            .filter(|event| event.status == status && event.created_at < before)
            .cloned()
            .collect::<Vec<_>>();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(matching
            .into_iter()
            .take(limit)
            .map(|event| event.id)
            .collect())
    }

    async fn delete_ids(&self, ids: &[String]) -> Result<u64, AppError> {
        self.check_available()?;
        self.delete_rounds.fetch_add(1, Ordering::SeqCst);

        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|event| !ids.contains(&event.id));
        Ok((before - events.len()) as u64)
    }
}
