use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::models::{Post, PostComment, UserSummary};
use crate::repo::{decode_images, encode_images, user_id_by_clerk};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub author_clerk_id: String,
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
}

const POST_SELECT: &str = r#"
    SELECT p.id, p.content, p.images, p.created_at, p.updated_at,
           u.id AS author_id, u.clerk_user_id AS author_clerk_id,
           u.username AS author_username
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

async fn post_from_row(pool: &SqlitePool, row: &SqliteRow) -> AppResult<Post> {
    let post_id: i64 = row.get("id");

    let likes: Vec<(i64,)> =
        sqlx::query_as("SELECT user_id FROM post_likes WHERE post_id = ? ORDER BY created_at")
            .bind(post_id)
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::from_sqlx(e, "post likes"))?;

    let comments: Vec<PostComment> = sqlx::query(
        r#"
        SELECT c.id, c.content, c.created_at,
               u.id AS user_id, u.clerk_user_id, u.username
        FROM post_comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.post_id = ?
        ORDER BY c.created_at
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "post comments"))?
    .iter()
    .map(|c| PostComment {
        id: c.get("id"),
        user: UserSummary {
            id: c.get("user_id"),
            clerk_user_id: c.get("clerk_user_id"),
            username: c.get("username"),
        },
        content: c.get("content"),
        created_at: c.get("created_at"),
    })
    .collect();

    Ok(Post {
        id: post_id,
        author: UserSummary {
            id: row.get("author_id"),
            clerk_user_id: row.get("author_clerk_id"),
            username: row.get("author_username"),
        },
        content: row.get("content"),
        images: decode_images(row.get::<String, _>("images").as_str()),
        likes: likes.into_iter().map(|(id,)| id).collect(),
        comments,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub async fn create(pool: &SqlitePool, new: NewPost) -> AppResult<Post> {
    if new.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let author_id = user_id_by_clerk(pool, &new.author_clerk_id).await?;
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO posts (author_id, content, images, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(author_id)
    .bind(&new.content)
    .bind(encode_images(&new.images))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "post"))?;

    get_by_id(pool, result.last_insert_rowid()).await
}

pub async fn get_by_id(pool: &SqlitePool, id: i64) -> AppResult<Post> {
    let sql = format!("{} WHERE p.id = ?", POST_SELECT);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "post"))?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

    post_from_row(pool, &row).await
}

pub async fn list(pool: &SqlitePool) -> AppResult<Vec<Post>> {
    let sql = format!("{} ORDER BY p.created_at DESC", POST_SELECT);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "posts"))?;

    futures::future::join_all(rows.iter().map(|row| post_from_row(pool, row)))
        .await
        .into_iter()
        .collect()
}

/// Like toggle: inserts the (post, user) row, or removes it when it is
/// already there.
pub async fn toggle_like(pool: &SqlitePool, post_id: i64, clerk_user_id: &str) -> AppResult<Post> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_sqlx(e, "post like"))?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_sqlx(e, "post"))?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Post {} not found", post_id)));
    }

    let user_id = user_id_by_clerk(&mut *tx, clerk_user_id).await?;

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::from_sqlx(e, "post like"))?;

    if inserted.rows_affected() == 0 {
        sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx(e, "post like"))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::from_sqlx(e, "post like"))?;

    get_by_id(pool, post_id).await
}

/// Appends a comment. Comments are never edited or removed through the API.
pub async fn add_comment(
    pool: &SqlitePool,
    post_id: i64,
    clerk_user_id: &str,
    content: &str,
) -> AppResult<Post> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "post"))?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Post {} not found", post_id)));
    }

    let user_id = user_id_by_clerk(pool, clerk_user_id).await?;

    sqlx::query(
        "INSERT INTO post_comments (post_id, user_id, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "post comment"))?;

    get_by_id(pool, post_id).await
}
