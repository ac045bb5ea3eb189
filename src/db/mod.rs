use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{domain::PaymentEventStatus, errors::AppError};

pub mod memory;
pub mod pg;

#[async_trait]
pub trait PaymentEventStore: Send + Sync {
    /// Ids of up to `limit` records in `status` created strictly before `before`.
    async fn expired_ids(
        &self,
        status: PaymentEventStatus,
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<String>, AppError>;

    async fn delete_ids(&self, ids: &[String]) -> Result<u64, AppError>;
}

pub async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|err| AppError::Internal(format!("migration failed: {err}")))
}
