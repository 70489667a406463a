use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::instrument;

use super::store::{content_type_for, is_safe_filename};
use crate::{error::ApiError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/public/uploads/images/:filename", get(get_image))
}

/// Serves an uploaded image by direct filename. Names containing path
/// separators or `..` are treated as absent.
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = format!("/public/uploads/images/{filename}");
    if !is_safe_filename(&filename) {
        return Err(ApiError::not_found("Image not found").at(path));
    }

    let body = state
        .media
        .read(&filename)
        .await
        .map_err(|e| ApiError::internal("Failed to read image", e).at(path.clone()))?
        .ok_or_else(|| ApiError::not_found("Image not found").at(path.clone()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&filename)),
    );
    if let Ok(value) = format!("inline; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((StatusCode::OK, headers, body))
}
