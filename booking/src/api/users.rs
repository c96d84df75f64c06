//! User endpoints.

use crate::auth::SessionUser;
use crate::server::state::AppState;
use axum::{Json, extract::State};
use fitbook_core::User;
use fitbook_web::AppError;
use serde::Serialize;

/// `{ success, user }`
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Always `true`
    pub success: bool,
    /// The caller's profile
    pub user: User,
}

/// The caller's profile.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/api/users/profile -H "Authorization: Bearer <token>"
/// ```
pub async fn profile(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.profile(&session.user).await?;
    Ok(Json(UserResponse { success: true, user }))
}

/// Promote the caller to instructor.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:5000/api/users/upgrade-to-instructor \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn upgrade_to_instructor(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.upgrade_to_instructor(&session.user).await?;
    Ok(Json(UserResponse { success: true, user }))
}
