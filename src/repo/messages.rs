use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{ConversationStatus, Message};
use crate::repo::user_id_by_clerk;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub conversation_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub product_id: Option<i64>,
}

const MESSAGE_SELECT: &str = r#"
    SELECT id, conversation_id, sender_id, receiver_id, content,
           is_read, product_id, created_at
    FROM messages
"#;

/// Inserts the message and repoints the conversation's lastMessage in the
/// same store transaction.
pub async fn create(pool: &SqlitePool, new: NewMessage) -> AppResult<Message> {
    if new.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    if new.sender_id == new.receiver_id {
        return Err(AppError::Validation("sender and receiver must differ".to_string()));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_sqlx(e, "message"))?;

    let status: Option<(ConversationStatus,)> =
        sqlx::query_as("SELECT status FROM conversations WHERE id = ?")
            .bind(new.conversation_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx(e, "conversation"))?;
    match status {
        None => {
            return Err(AppError::NotFound(format!(
                "Conversation {} not found",
                new.conversation_id
            )))
        }
        Some((ConversationStatus::Deleted,)) => {
            return Err(AppError::Validation("conversation is not active".to_string()))
        }
        Some((ConversationStatus::Active,)) => {}
    }

    let (member_count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM conversation_participants WHERE conversation_id = ? AND user_id IN (?, ?)",
    )
    .bind(new.conversation_id)
    .bind(new.sender_id)
    .bind(new.receiver_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_sqlx(e, "conversation participants"))?;
    if member_count != 2 {
        return Err(AppError::Validation(
            "sender and receiver must both be conversation participants".to_string(),
        ));
    }

    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO messages
            (conversation_id, sender_id, receiver_id, content, is_read, product_id, created_at)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(new.conversation_id)
    .bind(new.sender_id)
    .bind(new.receiver_id)
    .bind(&new.content)
    .bind(new.product_id)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::from_sqlx(e, "message"))?;

    let message_id = result.last_insert_rowid();
    sqlx::query("UPDATE conversations SET last_message_id = ?, updated_at = ? WHERE id = ?")
        .bind(message_id)
        .bind(now)
        .bind(new.conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversation"))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from_sqlx(e, "message"))?;

    get_by_id(pool, message_id).await
}

pub async fn get_by_id(pool: &SqlitePool, id: i64) -> AppResult<Message> {
    let sql = format!("{} WHERE id = ?", MESSAGE_SELECT);
    sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "message"))?
        .ok_or_else(|| AppError::NotFound(format!("Message {} not found", id)))
}

/// All messages in a conversation, newest first. Deleted conversations keep
/// their history readable.
pub async fn list_by_conversation(
    pool: &SqlitePool,
    conversation_id: i64,
) -> AppResult<Vec<Message>> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM conversations WHERE id = ?")
        .bind(conversation_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversation"))?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Conversation {} not found",
            conversation_id
        )));
    }

    let sql = format!(
        "{} WHERE conversation_id = ? ORDER BY created_at DESC, id DESC",
        MESSAGE_SELECT
    );
    sqlx::query_as(&sql)
        .bind(conversation_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "messages"))
}

/// Marks every unread message addressed to the caller as read. `is_read` is
/// the only field a message ever changes. Returns the number flipped.
pub async fn mark_read(
    pool: &SqlitePool,
    conversation_id: i64,
    receiver_clerk_id: &str,
) -> AppResult<u64> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM conversations WHERE id = ?")
        .bind(conversation_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversation"))?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Conversation {} not found",
            conversation_id
        )));
    }

    let receiver_id = user_id_by_clerk(pool, receiver_clerk_id).await?;

    let result = sqlx::query(
        "UPDATE messages SET is_read = 1 WHERE conversation_id = ? AND receiver_id = ? AND is_read = 0",
    )
    .bind(conversation_id)
    .bind(receiver_id)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "messages"))?;

    Ok(result.rows_affected())
}
