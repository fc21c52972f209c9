use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::info;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::models::{Product, UserProfile};
use crate::repo::users::{self, NewUser, UserUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/create", post(create_user))
        .route("/users/user/{clerk_user_id}", get(get_user))
        .route("/users/{clerk_user_id}", patch(update_user))
        .route("/users/favorites/{clerk_user_id}", get(list_favorites))
        .route(
            "/users/favorites/{clerk_user_id}/{product_id}",
            post(add_favorite).delete(remove_favorite),
        )
}

async fn create_user(
    State(state): State<AppState>,
    Json(new): Json<NewUser>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    info!("Creating user {}", new.username);
    let user = users::create(state.db.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(clerk_user_id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    let user = users::get_profile_by_clerk(state.db.pool(), &clerk_user_id).await?;
    Ok(Json(user))
}

async fn update_user(
    State(state): State<AppState>,
    Path(clerk_user_id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> AppResult<Json<UserProfile>> {
    let user = users::update_by_clerk(state.db.pool(), &clerk_user_id, update).await?;
    Ok(Json(user))
}

async fn list_favorites(
    State(state): State<AppState>,
    Path(clerk_user_id): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    let products = users::list_favorites(state.db.pool(), &clerk_user_id).await?;
    Ok(Json(products))
}

async fn add_favorite(
    State(state): State<AppState>,
    Path((clerk_user_id, product_id)): Path<(String, i64)>,
) -> AppResult<Json<Product>> {
    let product = users::add_favorite(state.db.pool(), &clerk_user_id, product_id).await?;
    Ok(Json(product))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Path((clerk_user_id, product_id)): Path<(String, i64)>,
) -> AppResult<Json<Product>> {
    let product = users::remove_favorite(state.db.pool(), &clerk_user_id, product_id).await?;
    Ok(Json(product))
}
