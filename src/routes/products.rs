use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::info;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::models::Product;
use crate::repo::products::{self, NewProduct, ProductUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/create", post(create_product))
        .route("/products/my/{clerk_user_id}", get(my_products))
        .route("/products/id/{product_id}", get(get_product))
        .route("/products/update/{product_id}", put(update_product))
        .route("/products/delete/{product_id}", delete(delete_product))
        .route("/products/{clerk_user_id}", get(browse_products))
}

async fn create_product(
    State(state): State<AppState>,
    Json(new): Json<NewProduct>,
) -> AppResult<(StatusCode, Json<Product>)> {
    info!("Creating product '{}'", new.title);
    let product = products::create(state.db.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn browse_products(
    State(state): State<AppState>,
    Path(clerk_user_id): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    let products = products::browse_for_user(state.db.pool(), &clerk_user_id).await?;
    Ok(Json(products))
}

async fn my_products(
    State(state): State<AppState>,
    Path(clerk_user_id): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    let products = products::list_by_seller(state.db.pool(), &clerk_user_id).await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Product>> {
    let product = products::get_by_id(state.db.pool(), product_id).await?;
    Ok(Json(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Json(update): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let product = products::update(state.db.pool(), product_id, update).await?;
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> AppResult<StatusCode> {
    products::delete(state.db.pool(), product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
