use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{Conversation, ConversationStatus, Message, UserSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConversation {
    pub participant_ids: Vec<i64>,
    pub product_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: i64,
    product_id: Option<i64>,
    last_message_id: Option<i64>,
    status: ConversationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const CONVERSATION_SELECT: &str = r#"
    SELECT id, product_id, last_message_id, status, created_at, updated_at
    FROM conversations
"#;

/// Sorted participant ids joined with `:`; the storage key the dedup index
/// is built over.
fn participants_key(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(":")
}

async fn populate(pool: &SqlitePool, row: ConversationRow) -> AppResult<Conversation> {
    let participants: Vec<UserSummary> = sqlx::query_as(
        r#"
        SELECT u.id, u.clerk_user_id, u.username
        FROM conversation_participants cp
        JOIN users u ON u.id = cp.user_id
        WHERE cp.conversation_id = ?
        ORDER BY u.id
        "#,
    )
    .bind(row.id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "conversation participants"))?;

    let last_message: Option<Message> = match row.last_message_id {
        Some(message_id) => sqlx::query_as(
            r#"
            SELECT id, conversation_id, sender_id, receiver_id, content,
                   is_read, product_id, created_at
            FROM messages WHERE id = ?
            "#,
        )
        .bind(message_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "last message"))?,
        None => None,
    };

    Ok(Conversation {
        id: row.id,
        participants,
        product_id: row.product_id,
        last_message,
        status: row.status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Idempotent create: at most one active conversation exists per
/// (participant set, product). The partial unique index turns the racy
/// check-then-insert into insert-or-fetch; losing a concurrent race lands in
/// the conflict branch and returns the winner's row.
pub async fn create(pool: &SqlitePool, new: NewConversation) -> AppResult<Conversation> {
    let mut ids = new.participant_ids.clone();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() < 2 {
        return Err(AppError::Validation(
            "participantIds needs at least two distinct users".to_string(),
        ));
    }

    let key = participants_key(&ids);
    let product_key = new.product_id.unwrap_or(0);
    let now = Utc::now();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversation"))?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO conversations
            (participants_key, product_id, product_key, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&key)
    .bind(new.product_id)
    .bind(product_key)
    .bind(ConversationStatus::Active)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await;

    let conversation_id = match inserted {
        Ok(result) => result.last_insert_rowid(),
        Err(e) => {
            let err = AppError::from_sqlx(e, "conversation");
            if !err.is_conflict() {
                return Err(err);
            }
            drop(tx);
            return get_active_by_key(pool, &key, product_key).await;
        }
    };

    for user_id in &ids {
        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id) VALUES (?, ?)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversation participant"))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversation"))?;

    get_by_id(pool, conversation_id).await
}

async fn get_active_by_key(
    pool: &SqlitePool,
    key: &str,
    product_key: i64,
) -> AppResult<Conversation> {
    let sql = format!(
        "{} WHERE participants_key = ? AND product_key = ? AND status = ?",
        CONVERSATION_SELECT
    );
    let row: ConversationRow = sqlx::query_as(&sql)
        .bind(key)
        .bind(product_key)
        .bind(ConversationStatus::Active)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversation"))?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    populate(pool, row).await
}

pub async fn get_by_id(pool: &SqlitePool, id: i64) -> AppResult<Conversation> {
    let sql = format!("{} WHERE id = ?", CONVERSATION_SELECT);
    let row: ConversationRow = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversation"))?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {} not found", id)))?;

    populate(pool, row).await
}

/// Active conversations for a user, most recently touched first.
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Conversation>> {
    let sql = format!(
        r#"{}
        WHERE status = ? AND id IN (
            SELECT conversation_id FROM conversation_participants WHERE user_id = ?
        )
        ORDER BY updated_at DESC
        "#,
        CONVERSATION_SELECT
    );
    let rows: Vec<ConversationRow> = sqlx::query_as(&sql)
        .bind(ConversationStatus::Active)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "conversations"))?;

    futures::future::join_all(rows.into_iter().map(|row| populate(pool, row)))
        .await
        .into_iter()
        .collect()
}

/// Soft delete: the row stays so its messages never orphan, and the partial
/// dedup index frees the (participants, product) slot for a fresh
/// conversation.
pub async fn soft_delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE conversations SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(ConversationStatus::Deleted)
    .bind(Utc::now())
    .bind(id)
    .bind(ConversationStatus::Active)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "conversation"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Conversation {} not found", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::repo::users::{self, NewUser};

    async fn setup() -> (Database, i64, i64) {
        let db = Database::new_in_memory().await.unwrap();
        let a = users::create(
            db.pool(),
            NewUser {
                clerk_user_id: "u1".into(),
                username: "alice".into(),
                email: "alice@campus.edu".into(),
                country_id: None,
                city_id: None,
                university_id: None,
            },
        )
        .await
        .unwrap();
        let b = users::create(
            db.pool(),
            NewUser {
                clerk_user_id: "u2".into(),
                username: "bob".into(),
                email: "bob@campus.edu".into(),
                country_id: None,
                city_id: None,
                university_id: None,
            },
        )
        .await
        .unwrap();
        (db, a.id, b.id)
    }

    #[tokio::test]
    async fn create_is_idempotent_per_participants_and_product() {
        let (db, a, b) = setup().await;

        let first = create(
            db.pool(),
            NewConversation { participant_ids: vec![a, b], product_id: None },
        )
        .await
        .unwrap();
        // Participant order must not matter.
        let second = create(
            db.pool(),
            NewConversation { participant_ids: vec![b, a], product_id: None },
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.participants.len(), 2);
    }

    #[tokio::test]
    async fn soft_delete_frees_the_slot() {
        let (db, a, b) = setup().await;

        let first = create(
            db.pool(),
            NewConversation { participant_ids: vec![a, b], product_id: None },
        )
        .await
        .unwrap();
        soft_delete(db.pool(), first.id).await.unwrap();

        let second = create(
            db.pool(),
            NewConversation { participant_ids: vec![a, b], product_id: None },
        )
        .await
        .unwrap();
        assert_ne!(first.id, second.id);

        // The deleted conversation is still addressable history.
        let old = get_by_id(db.pool(), first.id).await.unwrap();
        assert_eq!(old.status, ConversationStatus::Deleted);
    }

    #[tokio::test]
    async fn rejects_fewer_than_two_participants() {
        let (db, a, _) = setup().await;
        let err = create(
            db.pool(),
            NewConversation { participant_ids: vec![a, a], product_id: None },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
