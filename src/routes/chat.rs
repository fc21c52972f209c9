use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::extract::ClerkUser;
use crate::models::{Conversation, Message};
use crate::repo::conversations::{self, NewConversation};
use crate::repo::messages::{self, NewMessage};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conversations/user/{user_id}", get(list_conversations))
        .route("/conversations/create", post(create_conversation))
        .route("/conversations/{conversation_id}", delete(delete_conversation))
        .route("/messages", post(create_message))
        .route("/messages/read/{conversation_id}", put(mark_read))
        .route("/messages/{conversation_id}", get(list_messages))
}

async fn list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Conversation>>> {
    let conversations = conversations::list_for_user(state.db.pool(), user_id).await?;
    Ok(Json(conversations))
}

async fn create_conversation(
    State(state): State<AppState>,
    Json(new): Json<NewConversation>,
) -> AppResult<(StatusCode, Json<Conversation>)> {
    info!("Opening conversation for {:?}", new.participant_ids);
    let conversation = conversations::create(state.db.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
) -> AppResult<StatusCode> {
    conversations::soft_delete(state.db.pool(), conversation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_message(
    State(state): State<AppState>,
    Json(new): Json<NewMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let message = messages::create(state.db.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<i64>,
) -> AppResult<Json<Vec<Message>>> {
    let messages = messages::list_by_conversation(state.db.pool(), conversation_id).await?;
    Ok(Json(messages))
}

async fn mark_read(
    State(state): State<AppState>,
    ClerkUser(clerk_user_id): ClerkUser,
    Path(conversation_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let updated = messages::mark_read(state.db.pool(), conversation_id, &clerk_user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}
