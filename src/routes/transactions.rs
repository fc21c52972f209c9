use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::models::{Transaction, TransactionStatus};
use crate::repo::transactions::{self, NewTransaction};

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: TransactionStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions/create", post(create_transaction))
        .route("/transactions/buyer/{user_id}", get(list_by_buyer))
        .route("/transactions/seller/{user_id}", get(list_by_seller))
        .route("/transactions/update/{transaction_id}", put(update_status))
        .route("/transactions/{transaction_id}", get(get_transaction))
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(new): Json<NewTransaction>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    info!("Creating transaction buyer={} seller={}", new.buyer_id, new.seller_id);
    let transaction = transactions::create(state.db.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<i64>,
) -> AppResult<Json<Transaction>> {
    let transaction = transactions::get_by_id(state.db.pool(), transaction_id).await?;
    Ok(Json(transaction))
}

async fn list_by_buyer(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Transaction>>> {
    let transactions = transactions::list_by_buyer(state.db.pool(), user_id).await?;
    Ok(Json(transactions))
}

async fn list_by_seller(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Transaction>>> {
    let transactions = transactions::list_by_seller(state.db.pool(), user_id).await?;
    Ok(Json(transactions))
}

async fn update_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> AppResult<Json<Transaction>> {
    let transaction =
        transactions::update_status(state.db.pool(), transaction_id, update.status).await?;
    Ok(Json(transaction))
}
