//! Authorization gate: bearer extraction, token verification, session
//! lookup and the admin role check.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use vendo_core::auth::users::ROLE_ADMIN;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::ACCESS_COOKIE;

/// Every gate failure uses this one message; callers learn nothing about
/// which check rejected them.
const INVALID_SESSION: &str = "Invalid or expired token";

/// Identity resolved by the gate, available to handlers via extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

/// Pull the access token from the request: access cookie first, then the
/// `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Run the full gate chain: signature pre-check, metadata extraction,
/// session store lookup, then user resolution. Short-circuits on the
/// first failure.
async fn resolve_identity(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, AppError> {
    let token =
        bearer_token(headers).ok_or_else(|| AppError::Unauthorized(INVALID_SESSION.into()))?;

    state.sessions.token_valid(&token)?;
    let record = state.sessions.extract_token_metadata(&token)?;
    let user_id = state.sessions.get_auth(record.access_id).await?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_SESSION.into()))?;

    Ok(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    })
}

/// Middleware: admits only callers with a live, non-revoked session and
/// injects `AuthenticatedUser` into request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve_identity(&state, request.headers()).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Middleware: `require_session` plus an admin role check. Role failures
/// are 403, distinct from the 401 family of session failures.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve_identity(&state, request.headers()).await?;
    if identity.role != ROLE_ADMIN {
        return Err(AppError::Forbidden("Administrator access required".into()));
    }
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(INVALID_SESSION.into()))
    }
}
