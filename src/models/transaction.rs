use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Price, UserSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
}

/// Populated transaction. Only `status` is mutable after creation; the
/// product reference is nulled if the product is later deleted, the row
/// itself survives as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub buyer: UserSummary,
    pub seller: UserSummary,
    pub product_id: Option<i64>,
    pub price: Price,
    pub status: TransactionStatus,
    pub payment_method: String,
    pub delivery_method: String,
    pub meeting_location: Option<String>,
    pub meeting_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
