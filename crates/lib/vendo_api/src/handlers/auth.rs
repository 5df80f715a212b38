//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthenticatedUser, bearer_token};
use crate::models::{LoginRequest, LogoutResponse, RefreshRequest, RegisterRequest, TokenResponse};
use crate::services::{auth, cookies};

/// `POST /api/auth/register`: create a new user account and open a session.
pub async fn register_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let (resp, pair) =
        auth::register(&state, &body.email, &body.password, body.name.as_deref()).await?;
    Ok((cookies::with_session(jar, &pair), Json(resp)))
}

/// `POST /api/auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let (resp, pair) = auth::login(&state, &body.email, &body.password).await?;
    Ok((cookies::with_session(jar, &pair), Json(resp)))
}

/// `POST /api/auth/refresh`: exchange a refresh token for a new pair.
///
/// The token comes from the request body when present, else from the
/// refresh cookie.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RefreshRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let token = body
        .refresh_token
        .or_else(|| jar.get(cookies::REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))?;

    let (resp, pair) = auth::refresh(&state, &token).await?;
    Ok((cookies::with_session(jar, &pair), Json(resp)))
}

/// `POST /api/auth/logout`: revoke the caller's session and clear cookies.
/// Requires authentication.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    _user: AuthenticatedUser,
) -> AppResult<(CookieJar, Json<LogoutResponse>)> {
    // The gate already admitted this request, so the token is present.
    let access_token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))?;
    let refresh_token = jar
        .get(cookies::REFRESH_COOKIE)
        .map(|c| c.value().to_string());

    let resp = auth::logout(&state, &access_token, refresh_token.as_deref()).await?;
    Ok((cookies::without_session(jar), Json(resp)))
}
