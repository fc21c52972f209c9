use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::extract::ClerkUser;
use crate::models::{Follow, UserSummary};
use crate::repo::follows;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/{id}", post(follow_user))
        .route("/unfollow/{id}", post(unfollow_user))
        .route("/followers/{id}", get(list_followers))
        .route("/followings/{id}", get(list_followings))
}

async fn follow_user(
    State(state): State<AppState>,
    ClerkUser(clerk_user_id): ClerkUser,
    Path(following_id): Path<i64>,
) -> AppResult<(StatusCode, Json<Follow>)> {
    info!("{} follows user {}", clerk_user_id, following_id);
    let edge = follows::follow(state.db.pool(), &clerk_user_id, following_id).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

async fn unfollow_user(
    State(state): State<AppState>,
    ClerkUser(clerk_user_id): ClerkUser,
    Path(following_id): Path<i64>,
) -> AppResult<StatusCode> {
    follows::unfollow(state.db.pool(), &clerk_user_id, following_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_followers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<UserSummary>>> {
    let followers = follows::followers(state.db.pool(), user_id).await?;
    Ok(Json(followers))
}

async fn list_followings(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<UserSummary>>> {
    let followings = follows::followings(state.db.pool(), user_id).await?;
    Ok(Json(followings))
}
