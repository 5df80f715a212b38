//! Authentication and authorization logic.
//!
//! Provides token issuance and verification, the session store contract,
//! password policy enforcement, and user persistence shared across
//! `vendo_api` and the server binary.

pub mod password;
pub mod session;
pub mod store;
pub mod tokens;
pub mod users;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Uniform rejection for any malformed, unverifiable, expired or
    /// wrong-algorithm token. Carries no cause on purpose.
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid credentials")]
    CredentialError,

    /// No live session entry for the presented token ID. Revoked, expired
    /// and never-issued sessions all land here.
    #[error("session not found")]
    SessionNotFound,

    /// Refresh of an already-rotated or revoked token.
    #[error("unauthorized")]
    Unauthorized,

    #[error("email already registered")]
    EmailTaken,

    /// Aggregate password policy violations, one entry per unmet criterion.
    #[error("password does not meet requirements")]
    PolicyViolation(Vec<String>),

    #[error("database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
