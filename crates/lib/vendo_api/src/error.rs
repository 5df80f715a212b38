//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use vendo_core::auth::AuthError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Password policy failures, one message per unmet criterion.
    #[error("Password does not meet requirements")]
    PasswordPolicy(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone()),
            AppError::PasswordPolicy(_) => (
                StatusCode::BAD_REQUEST,
                "password_policy",
                "Password does not meet requirements".to_string(),
            ),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.clone()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.clone()),
            // The cause stays in the log, never in the response.
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            ),
        };
        let details = match self {
            AppError::PasswordPolicy(violations) => Some(violations),
            _ => None,
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            details,
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            // One uniform rejection for every flavor of bad or revoked
            // token, so responses leak nothing about which check failed.
            AuthError::InvalidToken | AuthError::SessionNotFound | AuthError::Unauthorized => {
                AppError::Unauthorized("Invalid or expired token".into())
            }
            AuthError::CredentialError => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::EmailTaken => AppError::Validation("Email already registered".into()),
            AuthError::PolicyViolation(violations) => AppError::PasswordPolicy(violations),
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
            AuthError::Internal(m) => AppError::Internal(m),
        }
    }
}
