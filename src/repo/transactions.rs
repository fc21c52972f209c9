use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::models::{Price, Transaction, TransactionStatus, UserSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub buyer_id: i64,
    pub seller_id: i64,
    pub product_id: Option<i64>,
    pub price: Price,
    pub payment_method: String,
    pub delivery_method: String,
    pub meeting_location: Option<String>,
    pub meeting_time: Option<DateTime<Utc>>,
}

const TRANSACTION_SELECT: &str = r#"
    SELECT t.id, t.product_id, t.price_amount, t.price_currency, t.status,
           t.payment_method, t.delivery_method, t.meeting_location,
           t.meeting_time, t.created_at, t.updated_at,
           b.id AS buyer_id, b.clerk_user_id AS buyer_clerk_id,
           b.username AS buyer_username,
           s.id AS seller_id, s.clerk_user_id AS seller_clerk_id,
           s.username AS seller_username
    FROM transactions t
    JOIN users b ON b.id = t.buyer_id
    JOIN users s ON s.id = t.seller_id
"#;

fn transaction_from_row(row: &SqliteRow) -> Transaction {
    Transaction {
        id: row.get("id"),
        buyer: UserSummary {
            id: row.get("buyer_id"),
            clerk_user_id: row.get("buyer_clerk_id"),
            username: row.get("buyer_username"),
        },
        seller: UserSummary {
            id: row.get("seller_id"),
            clerk_user_id: row.get("seller_clerk_id"),
            username: row.get("seller_username"),
        },
        product_id: row.get("product_id"),
        price: Price {
            amount: row.get("price_amount"),
            currency: row.get("price_currency"),
        },
        status: row.get("status"),
        payment_method: row.get("payment_method"),
        delivery_method: row.get("delivery_method"),
        meeting_location: row.get("meeting_location"),
        meeting_time: row.get("meeting_time"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn create(pool: &SqlitePool, new: NewTransaction) -> AppResult<Transaction> {
    if new.buyer_id == new.seller_id {
        return Err(AppError::Validation("buyer and seller must differ".to_string()));
    }
    if new.price.amount < 0.0 {
        return Err(AppError::Validation("price.amount must not be negative".to_string()));
    }
    if new.payment_method.trim().is_empty() {
        return Err(AppError::Validation("paymentMethod is required".to_string()));
    }
    if new.delivery_method.trim().is_empty() {
        return Err(AppError::Validation("deliveryMethod is required".to_string()));
    }

    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO transactions
            (buyer_id, seller_id, product_id, price_amount, price_currency,
             status, payment_method, delivery_method, meeting_location,
             meeting_time, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.buyer_id)
    .bind(new.seller_id)
    .bind(new.product_id)
    .bind(new.price.amount)
    .bind(&new.price.currency)
    .bind(TransactionStatus::Pending)
    .bind(&new.payment_method)
    .bind(&new.delivery_method)
    .bind(&new.meeting_location)
    .bind(new.meeting_time)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "transaction"))?;

    get_by_id(pool, result.last_insert_rowid()).await
}

pub async fn get_by_id(pool: &SqlitePool, id: i64) -> AppResult<Transaction> {
    let sql = format!("{} WHERE t.id = ?", TRANSACTION_SELECT);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "transaction"))?;

    row.map(|r| transaction_from_row(&r))
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
}

pub async fn list_by_buyer(pool: &SqlitePool, buyer_id: i64) -> AppResult<Vec<Transaction>> {
    let sql = format!(
        "{} WHERE t.buyer_id = ? ORDER BY t.created_at DESC",
        TRANSACTION_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(buyer_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "transactions"))?;

    Ok(rows.iter().map(transaction_from_row).collect())
}

pub async fn list_by_seller(pool: &SqlitePool, seller_id: i64) -> AppResult<Vec<Transaction>> {
    let sql = format!(
        "{} WHERE t.seller_id = ? ORDER BY t.created_at DESC",
        TRANSACTION_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(seller_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "transactions"))?;

    Ok(rows.iter().map(transaction_from_row).collect())
}

/// Status is the only field a transaction may change after creation.
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: TransactionStatus,
) -> AppResult<Transaction> {
    let result = sqlx::query("UPDATE transactions SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "transaction"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Transaction {} not found", id)));
    }

    get_by_id(pool, id).await
}
