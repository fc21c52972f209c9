use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::models::{NamedRef, Product, Rating, UserProfile};
use crate::repo::{products, user_id_by_clerk};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub clerk_user_id: String,
    pub username: String,
    pub email: String,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub university_id: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub university_id: Option<i64>,
}

const PROFILE_SELECT: &str = r#"
    SELECT u.id, u.clerk_user_id, u.username, u.email,
           u.rating_average, u.rating_count, u.created_at, u.updated_at,
           co.id AS country_id, co.name AS country_name,
           ci.id AS city_id, ci.name AS city_name,
           un.id AS university_id, un.name AS university_name
    FROM users u
    LEFT JOIN countries co ON co.id = u.country_id
    LEFT JOIN cities ci ON ci.id = u.city_id
    LEFT JOIN universities un ON un.id = u.university_id
"#;

fn named_ref(row: &SqliteRow, id_col: &str, name_col: &str) -> Option<NamedRef> {
    row.get::<Option<i64>, _>(id_col)
        .map(|id| NamedRef { id, name: row.get(name_col) })
}

fn profile_from_row(row: &SqliteRow, saved_products: Vec<i64>) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        clerk_user_id: row.get("clerk_user_id"),
        username: row.get("username"),
        email: row.get("email"),
        country: named_ref(row, "country_id", "country_name"),
        city: named_ref(row, "city_id", "city_name"),
        university: named_ref(row, "university_id", "university_name"),
        rating: Rating {
            average: row.get("rating_average"),
            count: row.get("rating_count"),
        },
        saved_products,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

async fn saved_product_ids(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT product_id FROM user_saved_products WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "saved products"))?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn create(pool: &SqlitePool, new: NewUser) -> AppResult<UserProfile> {
    if new.clerk_user_id.trim().is_empty() {
        return Err(AppError::Validation("clerkUserId is required".to_string()));
    }
    if new.username.trim().is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }
    if new.email.trim().is_empty() || !new.email.contains('@') {
        return Err(AppError::Validation("email is malformed".to_string()));
    }

    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO users
            (clerk_user_id, username, email, country_id, city_id, university_id,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.clerk_user_id)
    .bind(&new.username)
    .bind(&new.email)
    .bind(new.country_id)
    .bind(new.city_id)
    .bind(new.university_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "user"))?;

    get_profile_by_clerk(pool, &new.clerk_user_id).await
}

pub async fn get_profile_by_clerk(
    pool: &SqlitePool,
    clerk_user_id: &str,
) -> AppResult<UserProfile> {
    let sql = format!("{} WHERE u.clerk_user_id = ?", PROFILE_SELECT);
    let row = sqlx::query(&sql)
        .bind(clerk_user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "user"))?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", clerk_user_id)))?;

    let saved = saved_product_ids(pool, row.get("id")).await?;
    Ok(profile_from_row(&row, saved))
}

/// Partial profile update. Unknown users are NotFound; duplicate username or
/// email surfaces as Conflict via the unique indexes.
pub async fn update_by_clerk(
    pool: &SqlitePool,
    clerk_user_id: &str,
    update: UserUpdate,
) -> AppResult<UserProfile> {
    if update.username.is_none()
        && update.email.is_none()
        && update.country_id.is_none()
        && update.city_id.is_none()
        && update.university_id.is_none()
    {
        return Err(AppError::Validation("no fields to update".to_string()));
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
    qb.push_bind(Utc::now());

    if let Some(username) = &update.username {
        if username.trim().is_empty() {
            return Err(AppError::Validation("username must not be empty".to_string()));
        }
        qb.push(", username = ");
        qb.push_bind(username);
    }
    if let Some(email) = &update.email {
        if !email.contains('@') {
            return Err(AppError::Validation("email is malformed".to_string()));
        }
        qb.push(", email = ");
        qb.push_bind(email);
    }
    if let Some(country_id) = update.country_id {
        qb.push(", country_id = ");
        qb.push_bind(country_id);
    }
    if let Some(city_id) = update.city_id {
        qb.push(", city_id = ");
        qb.push_bind(city_id);
    }
    if let Some(university_id) = update.university_id {
        qb.push(", university_id = ");
        qb.push_bind(university_id);
    }

    qb.push(" WHERE clerk_user_id = ");
    qb.push_bind(clerk_user_id);

    let result = qb
        .build()
        .execute(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "user"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {} not found", clerk_user_id)));
    }

    get_profile_by_clerk(pool, clerk_user_id).await
}

pub async fn list_favorites(pool: &SqlitePool, clerk_user_id: &str) -> AppResult<Vec<Product>> {
    let user_id = user_id_by_clerk(pool, clerk_user_id).await?;

    let sql = r#"
        SELECT p.id, p.title, p.description, p.price_amount, p.price_currency,
               p.category, p.images, p.condition, p.status, p.saves,
               p.created_at, p.updated_at,
               u.id AS seller_id, u.clerk_user_id AS seller_clerk_id,
               u.username AS seller_username,
               ci.id AS city_id, ci.name AS city_name,
               co.id AS country_id, co.name AS country_name
        FROM user_saved_products sp
        JOIN products p ON p.id = sp.product_id
        JOIN users u ON u.id = p.seller_id
        LEFT JOIN cities ci ON ci.id = p.city_id
        LEFT JOIN countries co ON co.id = p.country_id
        WHERE sp.user_id = ?
        ORDER BY sp.created_at DESC
    "#;
    let rows = sqlx::query(sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "favorites"))?;

    Ok(rows.iter().map(products::product_from_row).collect())
}

/// Saves a product for the user. The join row and the denormalized saves
/// counter move together inside one store transaction, so they cannot
/// diverge under partial failure. Saving twice is a no-op.
pub async fn add_favorite(
    pool: &SqlitePool,
    clerk_user_id: &str,
    product_id: i64,
) -> AppResult<Product> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_sqlx(e, "favorite"))?;

    let user_id = user_id_by_clerk(&mut *tx, clerk_user_id).await?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_sqlx(e, "favorite"))?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Product {} not found", product_id)));
    }

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO user_saved_products (user_id, product_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::from_sqlx(e, "favorite"))?;

    if inserted.rows_affected() == 1 {
        sqlx::query("UPDATE products SET saves = saves + 1 WHERE id = ?")
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx(e, "saves counter"))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::from_sqlx(e, "favorite"))?;

    products::get_by_id(pool, product_id).await
}

/// Inverse of [`add_favorite`], same single-transaction guarantee.
pub async fn remove_favorite(
    pool: &SqlitePool,
    clerk_user_id: &str,
    product_id: i64,
) -> AppResult<Product> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::from_sqlx(e, "favorite"))?;

    let user_id = user_id_by_clerk(&mut *tx, clerk_user_id).await?;

    let removed = sqlx::query(
        "DELETE FROM user_saved_products WHERE user_id = ? AND product_id = ?",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::from_sqlx(e, "favorite"))?;

    if removed.rows_affected() == 1 {
        sqlx::query("UPDATE products SET saves = saves - 1 WHERE id = ? AND saves > 0")
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx(e, "saves counter"))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::from_sqlx(e, "favorite"))?;

    products::get_by_id(pool, product_id).await
}
