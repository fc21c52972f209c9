use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NamedRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: i64,
}

/// User with location references populated and the saved-products list
/// attached, as returned by `GET /users/user/:clerkUserId`. `clerk_user_id`
/// is the opaque identity-provider key joining our records to the
/// authentication boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub clerk_user_id: String,
    pub username: String,
    pub email: String,
    pub country: Option<NamedRef>,
    pub city: Option<NamedRef>,
    pub university: Option<NamedRef>,
    pub rating: Rating,
    pub saved_products: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
