use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{AuthResponse, Identity, LoginRequest};
use super::extractors::AuthUser;
use crate::{error::ApiError, response::ApiResponse, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/status", get(status))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let response = state
        .auth
        .validate_user(&payload.email, &payload.password)
        .await?;
    Ok(Json(ApiResponse::success(
        response,
        "Login successful",
        "/auth/login",
        StatusCode::OK,
    )))
}

/// Returns the identity the guard attached; useful as a token probe.
#[instrument(skip_all)]
pub async fn status(AuthUser(identity): AuthUser) -> Json<ApiResponse<Identity>> {
    Json(ApiResponse::success(
        identity,
        "Authenticated",
        "/auth/status",
        StatusCode::OK,
    ))
}
