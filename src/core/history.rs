//! Purchase history types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user's most recent completed purchase, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastTransaction {
    pub service_provider: Option<String>,
    pub destination_currency: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait TransactionHistory: Send + Sync {
    async fn latest_transaction(&self) -> Result<Option<PastTransaction>>;
}
