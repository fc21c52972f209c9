// Access layer: one module per entity, direct sqlx queries against the
// schema in `db`. Handlers call exactly one function from here per request.

pub mod conversations;
pub mod follows;
pub mod images;
pub mod locations;
pub mod messages;
pub mod posts;
pub mod products;
pub mod transactions;
pub mod users;

use crate::error::{AppError, AppResult};

/// Image url lists are persisted as a JSON array in a TEXT column.
pub(crate) fn encode_images(images: &[String]) -> String {
    serde_json::to_string(images).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn decode_images(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Resolves a clerk user id to our internal row id.
pub(crate) async fn user_id_by_clerk<'e, E>(executor: E, clerk_user_id: &str) -> AppResult<i64>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE clerk_user_id = ?")
        .bind(clerk_user_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::from_sqlx(e, "user lookup"))?;

    row.map(|(id,)| id)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", clerk_user_id)))
}
