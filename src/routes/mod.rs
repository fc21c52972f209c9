// HTTP route layer: each handler maps one (method, path) to one access-layer
// call. All routes live under /api.

pub mod chat;
pub mod follows;
pub mod images;
pub mod locations;
pub mod posts;
pub mod products;
pub mod transactions;
pub mod users;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::seed;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .route("/seed", post(seed_handler))
        .merge(users::router())
        .merge(products::router())
        .merge(posts::router())
        .merge(chat::router())
        .merge(follows::router())
        .merge(transactions::router())
        .merge(locations::router())
        .merge(images::router());

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new().layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "campus-market",
        "timestamp": chrono::Utc::now(),
    }))
}

async fn seed_handler(State(state): State<AppState>) -> AppResult<Json<seed::SeedSummary>> {
    info!("Seeding fixture data");
    let summary = seed::seed_all(state.db.pool()).await?;
    Ok(Json(summary))
}
