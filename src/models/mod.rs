// Entity records and the populated response shapes the API returns.

pub mod chat;
pub mod follow;
pub mod image;
pub mod location;
pub mod post;
pub mod product;
pub mod transaction;
pub mod user;

pub use chat::{Conversation, ConversationStatus, Message};
pub use follow::Follow;
pub use image::Image;
pub use location::{City, Country, University};
pub use post::{Post, PostComment};
pub use product::{Product, ProductLocation, ProductStatus};
pub use transaction::{Transaction, TransactionStatus};
pub use user::{Rating, UserProfile};

use serde::{Deserialize, Serialize};

/// Money value as stored and returned: amount plus ISO currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

/// Populated reference to a named row (country, city, university).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

/// Minimal populated user reference embedded in other documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub clerk_user_id: String,
    pub username: String,
}
