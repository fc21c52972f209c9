use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::{City, Country, University};

pub async fn create_country(pool: &SqlitePool, name: &str) -> AppResult<Country> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let result = sqlx::query("INSERT INTO countries (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "country"))?;

    get_country(pool, result.last_insert_rowid()).await
}

pub async fn get_country(pool: &SqlitePool, id: i64) -> AppResult<Country> {
    sqlx::query_as("SELECT id, name, created_at FROM countries WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "country"))?
        .ok_or_else(|| AppError::NotFound(format!("Country {} not found", id)))
}

pub async fn list_countries(pool: &SqlitePool) -> AppResult<Vec<Country>> {
    sqlx::query_as("SELECT id, name, created_at FROM countries ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "countries"))
}

pub async fn create_city(pool: &SqlitePool, name: &str, country_id: i64) -> AppResult<City> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let result =
        sqlx::query("INSERT INTO cities (name, country_id, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(country_id)
            .bind(Utc::now())
            .execute(pool)
            .await
            .map_err(|e| AppError::from_sqlx(e, "city"))?;

    let id = result.last_insert_rowid();
    sqlx::query_as("SELECT id, name, country_id, created_at FROM cities WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "city"))?
        .ok_or_else(|| AppError::NotFound(format!("City {} not found", id)))
}

pub async fn list_cities_by_country(pool: &SqlitePool, country_id: i64) -> AppResult<Vec<City>> {
    sqlx::query_as(
        "SELECT id, name, country_id, created_at FROM cities WHERE country_id = ? ORDER BY name",
    )
    .bind(country_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "cities"))
}

pub async fn create_university(
    pool: &SqlitePool,
    name: &str,
    city_id: i64,
    country_id: i64,
) -> AppResult<University> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let result = sqlx::query(
        "INSERT INTO universities (name, city_id, country_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(city_id)
    .bind(country_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "university"))?;

    let id = result.last_insert_rowid();
    sqlx::query_as(
        "SELECT id, name, city_id, country_id, created_at FROM universities WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "university"))?
    .ok_or_else(|| AppError::NotFound(format!("University {} not found", id)))
}

pub async fn list_universities_by_city(
    pool: &SqlitePool,
    city_id: i64,
) -> AppResult<Vec<University>> {
    sqlx::query_as(
        "SELECT id, name, city_id, country_id, created_at FROM universities WHERE city_id = ? ORDER BY name",
    )
    .bind(city_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::from_sqlx(e, "universities"))
}
