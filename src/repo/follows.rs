use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{Follow, UserSummary};
use crate::repo::user_id_by_clerk;

/// Inserts the directed edge follower → following. A second identical edge
/// is a Conflict, not a silent no-op, so the client can tell.
pub async fn follow(
    pool: &SqlitePool,
    follower_clerk_id: &str,
    following_id: i64,
) -> AppResult<Follow> {
    let follower_id = user_id_by_clerk(pool, follower_clerk_id).await?;
    if follower_id == following_id {
        return Err(AppError::Validation("cannot follow yourself".to_string()));
    }

    let target: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
        .bind(following_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "user"))?;
    if target.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", following_id)));
    }

    let result = sqlx::query(
        "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(follower_id)
    .bind(following_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "follow edge"))?;

    sqlx::query_as(
        "SELECT id, follower_id, following_id, created_at FROM follows WHERE id = ?",
    )
    .bind(result.last_insert_rowid())
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "follow edge"))?
    .ok_or_else(|| AppError::NotFound("Follow edge not found".to_string()))
}

pub async fn unfollow(
    pool: &SqlitePool,
    follower_clerk_id: &str,
    following_id: i64,
) -> AppResult<()> {
    let follower_id = user_id_by_clerk(pool, follower_clerk_id).await?;

    let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
        .bind(follower_id)
        .bind(following_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "follow edge"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Follow edge not found".to_string()));
    }
    Ok(())
}

pub async fn followers(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<UserSummary>> {
    sqlx::query_as(
        r#"
        SELECT u.id, u.clerk_user_id, u.username
        FROM follows f
        JOIN users u ON u.id = f.follower_id
        WHERE f.following_id = ?
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "followers"))
}

pub async fn followings(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<UserSummary>> {
    sqlx::query_as(
        r#"
        SELECT u.id, u.clerk_user_id, u.username
        FROM follows f
        JOIN users u ON u.id = f.following_id
        WHERE f.follower_id = ?
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "followings"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::repo::users::{self, NewUser};

    async fn user(db: &Database, clerk: &str, name: &str) -> i64 {
        users::create(
            db.pool(),
            NewUser {
                clerk_user_id: clerk.into(),
                username: name.into(),
                email: format!("{}@campus.edu", name),
                country_id: None,
                city_id: None,
                university_id: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn duplicate_edge_is_a_conflict() {
        let db = Database::new_in_memory().await.unwrap();
        let _a = user(&db, "u1", "alice").await;
        let b = user(&db, "u2", "bob").await;

        follow(db.pool(), "u1", b).await.unwrap();
        let err = follow(db.pool(), "u1", b).await.unwrap_err();
        assert!(err.is_conflict());

        let followers = followers(db.pool(), b).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].clerk_user_id, "u1");
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let db = Database::new_in_memory().await.unwrap();
        let a = user(&db, "u1", "alice").await;

        let err = follow(db.pool(), "u1", a).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unfollow_removes_the_edge() {
        let db = Database::new_in_memory().await.unwrap();
        let _a = user(&db, "u1", "alice").await;
        let b = user(&db, "u2", "bob").await;

        follow(db.pool(), "u1", b).await.unwrap();
        unfollow(db.pool(), "u1", b).await.unwrap();
        assert!(followers(db.pool(), b).await.unwrap().is_empty());

        // Removing again is NotFound, matching the delete contract.
        let err = unfollow(db.pool(), "u1", b).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
