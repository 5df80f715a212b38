//! Authentication service: register/login/refresh/logout flows delegating
//! to `vendo_core::auth`.

use tracing::info;
use vendo_core::auth::AuthError;
use vendo_core::auth::password;
use vendo_core::auth::tokens::ACCESS_TOKEN_TTL_SECS;
use vendo_core::auth::users::{ROLE_ADMIN, ROLE_USER};
use vendo_core::models::auth::{TokenPair, User};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{AuthUser, LogoutResponse, TokenResponse};

/// Build a `TokenResponse` from user data plus a fresh token pair.
fn build_token_response(user: &User, pair: &TokenPair) -> TokenResponse {
    TokenResponse {
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
        expires_in: ACCESS_TOKEN_TTL_SECS,
        token_type: "Bearer".to_string(),
        user: AuthUser::from(user),
    }
}

/// Register a new user account. The first account gets the admin role.
pub async fn register(
    state: &AppState,
    email: &str,
    password_raw: &str,
    name: Option<&str>,
) -> AppResult<(TokenResponse, TokenPair)> {
    state.config.password_policy.validate(password_raw)?;

    if state.users.email_exists(email).await? {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let password_hash = password::hash_password(password_raw)?;

    let role = if state.users.count().await? == 0 {
        ROLE_ADMIN
    } else {
        ROLE_USER
    };
    let user = state.users.create(email, name, &password_hash, role).await?;
    if user.role == ROLE_ADMIN {
        info!(email, "first user granted admin role");
    }

    let pair = state.sessions.issue_tokens(user.id)?;
    state.sessions.save_auth(user.id, &pair).await?;
    info!(user_id = user.id, "user registered");

    Ok((build_token_response(&user, &pair), pair))
}

/// Authenticate with email + password.
///
/// Unknown emails and wrong passwords are indistinguishable to the caller.
pub async fn login(
    state: &AppState,
    email: &str,
    password_raw: &str,
) -> AppResult<(TokenResponse, TokenPair)> {
    let Some(found) = state.users.find_by_email(email).await? else {
        return Err(AuthError::CredentialError.into());
    };

    if !password::verify_password(password_raw, &found.password_hash) {
        return Err(AuthError::CredentialError.into());
    }

    let user = found.user;
    let pair = state.sessions.issue_tokens(user.id)?;
    state.sessions.save_auth(user.id, &pair).await?;
    info!(user_id = user.id, "user logged in");

    Ok((build_token_response(&user, &pair), pair))
}

/// Exchange a refresh token for a new pair (single-use rotation).
pub async fn refresh(state: &AppState, refresh_token: &str) -> AppResult<(TokenResponse, TokenPair)> {
    let pair = state.sessions.refresh(refresh_token).await?;

    let record = state.sessions.extract_token_metadata(&pair.access_token)?;
    let user = state
        .users
        .find_by_id(record.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))?;
    info!(user_id = user.id, "session rotated");

    Ok((build_token_response(&user, &pair), pair))
}

/// Logout: delete the caller's access entry and, when the client still
/// holds one, the matching refresh entry.
pub async fn logout(
    state: &AppState,
    access_token: &str,
    refresh_token: Option<&str>,
) -> AppResult<LogoutResponse> {
    let record = state.sessions.extract_token_metadata(access_token)?;
    state.sessions.delete_auth(record.access_id).await?;

    // Best effort: an invalid or already-rotated refresh token is fine here.
    if let Some(token) = refresh_token {
        let _ = state.sessions.revoke_refresh(token).await;
    }

    info!(user_id = record.user_id, "user logged out");
    Ok(LogoutResponse { success: true })
}
