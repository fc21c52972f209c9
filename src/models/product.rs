use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NamedRef, Price, UserSummary};

/// Listing lifecycle. Status only ever moves among these three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ProductStatus {
    Available,
    Sold,
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLocation {
    pub city: Option<NamedRef>,
    pub country: Option<NamedRef>,
}

/// Populated product document: seller and location references resolved,
/// price nested, image urls decoded from their stored form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub images: Vec<String>,
    pub seller: UserSummary,
    pub location: ProductLocation,
    pub condition: String,
    pub status: ProductStatus,
    pub saves: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
