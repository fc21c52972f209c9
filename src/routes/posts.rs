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
use crate::extract::ClerkUser;
use crate::models::Post;
use crate::repo::posts::{self, NewPost};

#[derive(Debug, Deserialize)]
struct CommentRequest {
    content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/create", post(create_post))
        .route("/posts/like/{post_id}", put(toggle_like))
        .route("/posts/comment/{post_id}", put(add_comment))
}

async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<Post>>> {
    let posts = posts::list(state.db.pool()).await?;
    Ok(Json(posts))
}

async fn create_post(
    State(state): State<AppState>,
    Json(new): Json<NewPost>,
) -> AppResult<(StatusCode, Json<Post>)> {
    info!("Creating post by {}", new.author_clerk_id);
    let post = posts::create(state.db.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn toggle_like(
    State(state): State<AppState>,
    ClerkUser(clerk_user_id): ClerkUser,
    Path(post_id): Path<i64>,
) -> AppResult<Json<Post>> {
    let post = posts::toggle_like(state.db.pool(), post_id, &clerk_user_id).await?;
    Ok(Json(post))
}

async fn add_comment(
    State(state): State<AppState>,
    ClerkUser(clerk_user_id): ClerkUser,
    Path(post_id): Path<i64>,
    Json(request): Json<CommentRequest>,
) -> AppResult<Json<Post>> {
    let post =
        posts::add_comment(state.db.pool(), post_id, &clerk_user_id, &request.content).await?;
    Ok(Json(post))
}
