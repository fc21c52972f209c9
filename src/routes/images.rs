use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::models::Image;
use crate::repo::images;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest {
    user_id: String,
    image_url: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/images/upload", post(upload_image))
}

/// The media host already stores the bytes; we only record who uploaded
/// which url.
async fn upload_image(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> AppResult<(StatusCode, Json<Image>)> {
    let image = images::create(state.db.pool(), &request.user_id, &request.image_url).await?;
    Ok((StatusCode::CREATED, Json(image)))
}
