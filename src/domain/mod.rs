use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentEventStatus {
    Processed,
    Error,
}

impl PaymentEventStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }
}

/// A payment-processor webhook record. Written by the webhook ingestion path,
/// only ever read and deleted here.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentEvent {
    pub id: String,
    pub status: PaymentEventStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub processed: u64,
    pub error: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.processed + self.error
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub(crate) fn record(&mut self, status: PaymentEventStatus, deleted: u64) {
        match status {
            PaymentEventStatus::Processed => self.processed += deleted,
            PaymentEventStatus::Error => self.error += deleted,
        }
    }
}
