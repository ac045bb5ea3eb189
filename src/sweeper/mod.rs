//! Retention sweeper for payment-event records.
//!
//! Records in a terminal status are deleted once they are older than that
//! status' retention window. Deletion runs in rounds of at most `batch_size`
//! ids so no single statement holds a large lock.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{
    config::SweeperConfig,
    db::PaymentEventStore,
    domain::{PaymentEventStatus, SweepReport},
    errors::AppError,
};

#[derive(Clone)]
pub struct RetentionSweeper {
    store: Arc<dyn PaymentEventStore>,
    config: SweeperConfig,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn PaymentEventStore>, config: SweeperConfig) -> Self {
        Self { store, config }
    }

    pub async fn purge_expired(&self) -> Result<SweepReport, AppError> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        let mut report = SweepReport::default();

        for (status, retention_days) in [
            (
                PaymentEventStatus::Processed,
                self.config.processed_retention_days,
            ),
            (PaymentEventStatus::Error, self.config.error_retention_days),
        ] {
            let cutoff = now
                .checked_sub_signed(chrono::Duration::days(i64::from(retention_days)))
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "{} retention of {retention_days} days is out of range",
                        status.as_str()
                    ))
                })?;
            let deleted = self.purge_status(status, cutoff).await?;
            report.record(status, deleted);
        }

        if !report.is_empty() {
            tracing::info!(
                processed = report.processed,
                error = report.error,
                "payment event cleanup deleted expired records"
            );
        }

        Ok(report)
    }

    async fn purge_status(
        &self,
        status: PaymentEventStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let batch_size = self.config.batch_size;
        let mut total = 0;

        loop {
            let ids = self.store.expired_ids(status, cutoff, batch_size).await?;
            if ids.is_empty() {
                break;
            }

            total += self.store.delete_ids(&ids).await?;
            tracing::debug!(
                status = status.as_str(),
                batch = ids.len(),
                total,
                "deleted payment event batch"
            );

            if ids.len() < batch_size {
                break;
            }
        }

        Ok(total)
    }
}

/// Runs `sweeper` every `period` until the task is aborted. The first sweep
/// happens immediately. Failures are logged and left for the next tick.
pub fn spawn_schedule(sweeper: RetentionSweeper, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(err) = sweeper.purge_expired().await {
                tracing::error!(error = %err, "payment event cleanup failed");
            }
        }
    })
}
