use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::response::{ApiResponse, ErrorDetail};

/// Domain error taxonomy; every member maps to a fixed HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Typed operation failure. `message` is always user-safe; the underlying
/// low-level text (store errors and the like) travels only in `detail`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub path: String,
    pub detail: Option<String>,
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: String::new(),
            detail: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>, source: impl std::fmt::Display) -> Self {
        let mut err = Self::new(ErrorKind::Internal, message);
        err.detail = Some(source.to_string());
        err
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.kind == ErrorKind::Internal {
            tracing::error!(path = %self.path, detail = ?self.detail, "{}", self.message);
        } else {
            tracing::warn!(path = %self.path, kind = ?self.kind, "{}", self.message);
        }
        let detail = self.detail.unwrap_or_else(|| self.message.clone());
        let body = ApiResponse::failure(
            &self.message,
            &self.path,
            status,
            vec![ErrorDetail::new(detail, Some(self.path.clone()))],
        );
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(ErrorKind::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorKind::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_keeps_low_level_text_in_detail_only() {
        let err = ApiError::internal("Failed to create user", "duplicate key value").at("/users");
        assert_eq!(err.message, "Failed to create user");
        assert_eq!(err.detail.as_deref(), Some("duplicate key value"));
        assert_eq!(err.path, "/users");
    }

    #[test]
    fn builder_attaches_path() {
        let err = ApiError::not_found("User with ID 7 not found").at("/users/7");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.path, "/users/7");
        assert!(err.detail.is_none());
    }
}
