use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of an upload to the external media host. The url is opaque to us
/// and stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: i64,
    #[serde(rename = "userId")]
    pub clerk_user_id: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}
