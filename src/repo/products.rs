use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::models::{NamedRef, Price, Product, ProductLocation, ProductStatus, UserSummary};
use crate::repo::{decode_images, encode_images, user_id_by_clerk};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub seller_clerk_id: String,
    pub city_id: Option<i64>,
    pub country_id: Option<i64>,
    pub condition: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub city_id: Option<i64>,
    pub country_id: Option<i64>,
    pub condition: Option<String>,
    pub status: Option<ProductStatus>,
}

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.title, p.description, p.price_amount, p.price_currency,
           p.category, p.images, p.condition, p.status, p.saves,
           p.created_at, p.updated_at,
           u.id AS seller_id, u.clerk_user_id AS seller_clerk_id,
           u.username AS seller_username,
           ci.id AS city_id, ci.name AS city_name,
           co.id AS country_id, co.name AS country_name
    FROM products p
    JOIN users u ON u.id = p.seller_id
    LEFT JOIN cities ci ON ci.id = p.city_id
    LEFT JOIN countries co ON co.id = p.country_id
"#;

pub(crate) fn product_from_row(row: &SqliteRow) -> Product {
    let city = row
        .get::<Option<i64>, _>("city_id")
        .map(|id| NamedRef { id, name: row.get("city_name") });
    let country = row
        .get::<Option<i64>, _>("country_id")
        .map(|id| NamedRef { id, name: row.get("country_name") });

    Product {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        price: Price {
            amount: row.get("price_amount"),
            currency: row.get("price_currency"),
        },
        category: row.get("category"),
        images: decode_images(row.get::<String, _>("images").as_str()),
        seller: UserSummary {
            id: row.get("seller_id"),
            clerk_user_id: row.get("seller_clerk_id"),
            username: row.get("seller_username"),
        },
        location: ProductLocation { city, country },
        condition: row.get("condition"),
        status: row.get("status"),
        saves: row.get("saves"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn create(pool: &SqlitePool, new: NewProduct) -> AppResult<Product> {
    if new.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if new.description.trim().is_empty() {
        return Err(AppError::Validation("description is required".to_string()));
    }
    if new.price.amount < 0.0 {
        return Err(AppError::Validation("price.amount must not be negative".to_string()));
    }
    if new.condition.trim().is_empty() {
        return Err(AppError::Validation("condition is required".to_string()));
    }

    let seller_id = user_id_by_clerk(pool, &new.seller_clerk_id).await?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO products
            (title, description, price_amount, price_currency, category, images,
             seller_id, city_id, country_id, condition, status, saves, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.price.amount)
    .bind(&new.price.currency)
    .bind(&new.category)
    .bind(encode_images(&new.images))
    .bind(seller_id)
    .bind(new.city_id)
    .bind(new.country_id)
    .bind(&new.condition)
    .bind(ProductStatus::Available)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "product"))?;

    get_by_id(pool, result.last_insert_rowid()).await
}

pub async fn get_by_id(pool: &SqlitePool, id: i64) -> AppResult<Product> {
    let sql = format!("{} WHERE p.id = ?", PRODUCT_SELECT);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "product"))?;

    row.map(|r| product_from_row(&r))
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
}

/// Browse feed: every Available product that is not the caller's own,
/// newest first.
pub async fn browse_for_user(pool: &SqlitePool, clerk_user_id: &str) -> AppResult<Vec<Product>> {
    let viewer_id = user_id_by_clerk(pool, clerk_user_id).await?;

    let sql = format!(
        "{} WHERE p.status = ? AND p.seller_id != ? ORDER BY p.created_at DESC",
        PRODUCT_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(ProductStatus::Available)
        .bind(viewer_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "products"))?;

    Ok(rows.iter().map(product_from_row).collect())
}

pub async fn list_by_seller(pool: &SqlitePool, clerk_user_id: &str) -> AppResult<Vec<Product>> {
    let seller_id = user_id_by_clerk(pool, clerk_user_id).await?;

    let sql = format!(
        "{} WHERE p.seller_id = ? ORDER BY p.created_at DESC",
        PRODUCT_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(seller_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "products"))?;

    Ok(rows.iter().map(product_from_row).collect())
}

/// Named-field replacement. Untouched fields keep their stored values; an
/// update naming no fields is rejected.
pub async fn update(pool: &SqlitePool, id: i64, update: ProductUpdate) -> AppResult<Product> {
    if update.title.is_none()
        && update.description.is_none()
        && update.price.is_none()
        && update.category.is_none()
        && update.images.is_none()
        && update.city_id.is_none()
        && update.country_id.is_none()
        && update.condition.is_none()
        && update.status.is_none()
    {
        return Err(AppError::Validation("no fields to update".to_string()));
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE products SET updated_at = ");
    qb.push_bind(Utc::now());

    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        qb.push(", title = ");
        qb.push_bind(title);
    }
    if let Some(description) = &update.description {
        qb.push(", description = ");
        qb.push_bind(description);
    }
    if let Some(price) = &update.price {
        if price.amount < 0.0 {
            return Err(AppError::Validation("price.amount must not be negative".to_string()));
        }
        qb.push(", price_amount = ");
        qb.push_bind(price.amount);
        qb.push(", price_currency = ");
        qb.push_bind(&price.currency);
    }
    if let Some(category) = &update.category {
        qb.push(", category = ");
        qb.push_bind(category);
    }
    if let Some(images) = &update.images {
        qb.push(", images = ");
        qb.push_bind(encode_images(images));
    }
    if let Some(city_id) = update.city_id {
        qb.push(", city_id = ");
        qb.push_bind(city_id);
    }
    if let Some(country_id) = update.country_id {
        qb.push(", country_id = ");
        qb.push_bind(country_id);
    }
    if let Some(condition) = &update.condition {
        qb.push(", condition = ");
        qb.push_bind(condition);
    }
    if let Some(status) = update.status {
        qb.push(", status = ");
        qb.push_bind(status);
    }

    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb
        .build()
        .execute(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "product"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Product {} not found", id)));
    }

    get_by_id(pool, id).await
}

/// Removes the listing. Transactions and messages that reference it survive
/// with their product reference nulled; saved-products rows cascade.
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "product"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Product {} not found", id)));
    }
    Ok(())
}
