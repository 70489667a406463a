use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use tracing::warn;

use super::dto::Identity;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo;

/// Bearer-token guard. Routes that never mention this extractor are public;
/// everything else gets a verified, freshly loaded identity or a 401.
pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();

        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                ApiError::unauthorized("Missing Authorization header").at(path.clone())
            })?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::unauthorized("Invalid auth scheme").at(path.clone()))?;

        let claims = state.keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::unauthorized("Invalid or expired token").at(path.clone())
        })?;

        // Claims may outlive the user; load the current record instead of
        // trusting them for authorization.
        let identity = repo::find_identity(&state.db, claims.sub)
            .await
            .map_err(|e| ApiError::internal("Failed to load user", e).at(path.clone()))?
            .ok_or_else(|| {
                warn!(user_id = claims.sub, "token valid but user gone");
                ApiError::unauthorized("User not found").at(path.clone())
            })?;

        Ok(AuthUser(identity))
    }
}
