use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{db::PaymentEventStore, domain::PaymentEventStatus, errors::AppError};

#[derive(Clone)]
pub struct PgPaymentEventStore {
    pool: PgPool,
}

impl PgPaymentEventStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        Ok(Self::new(super::connect(database_url).await?))
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PaymentEventStore for PgPaymentEventStore {
    async fn expired_ids(
        &self,
        status: PaymentEventStatus,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, AppError> {
        let limit = i64::try_from(limit)
            .map_err(|_| AppError::Internal(format!("batch size out of range: {limit}")))?;

        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id
            FROM payment_events
            WHERE status = $1 AND created_at < $2
            ORDER BY created_at ASC
            LIMIT $3
            "#,
        )
        .bind(status)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn delete_ids(&self, ids: &[String]) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM payment_events WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
