use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directed follow edge between users. (follower, following) is unique.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: DateTime<Utc>,
}
