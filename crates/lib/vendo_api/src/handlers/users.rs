//! Current-user and administration handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AuthUser, UserListResponse};

/// `GET /api/auth/me`: the caller's own account.
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<AuthUser>> {
    let user = state
        .users
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(AuthUser::from(&user)))
}

/// `GET /api/admin/users`: all accounts, oldest first. Admin only.
pub async fn list_users_handler(
    State(state): State<AppState>,
    _admin: AuthenticatedUser,
) -> AppResult<Json<UserListResponse>> {
    let users = state.users.list().await?;
    Ok(Json(UserListResponse {
        users: users.iter().map(AuthUser::from).collect(),
    }))
}
