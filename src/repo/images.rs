use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::Image;

/// Records an upload to the media host. The url is issued externally and
/// stored verbatim.
pub async fn create(pool: &SqlitePool, clerk_user_id: &str, image_url: &str) -> AppResult<Image> {
    if clerk_user_id.trim().is_empty() {
        return Err(AppError::Validation("userId is required".to_string()));
    }
    if image_url.trim().is_empty() {
        return Err(AppError::Validation("imageUrl is required".to_string()));
    }

    let result = sqlx::query(
        "INSERT INTO images (clerk_user_id, image_url, created_at) VALUES (?, ?, ?)",
    )
    .bind(clerk_user_id)
    .bind(image_url)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "image"))?;

    sqlx::query_as("SELECT id, clerk_user_id, image_url, created_at FROM images WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "image"))?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))
}
