use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserSummary;

/// Comment embedded in a post response. Append-only through the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostComment {
    pub id: i64,
    pub user: UserSummary,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Populated post: author resolved, likes as user ids, comments embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub author: UserSummary,
    pub content: String,
    pub images: Vec<String>,
    pub likes: Vec<i64>,
    pub comments: Vec<PostComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
