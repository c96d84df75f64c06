//! Notification inbox endpoints.

use super::{MessageResponse, parse_id};
use crate::auth::SessionUser;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use fitbook_core::Notification;
use fitbook_web::AppError;
use serde::Serialize;

/// `{ success, notifications }`
#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    /// Always `true`
    pub success: bool,
    /// Newest first
    pub notifications: Vec<Notification>,
}

/// `{ success, updated }`
#[derive(Debug, Serialize)]
pub struct MarkAllResponse {
    /// Always `true`
    pub success: bool,
    /// Notifications that flipped from unread to read
    pub updated: u64,
}

/// The caller's notifications, newest first.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/api/notifications -H "Authorization: Bearer <token>"
/// ```
pub async fn list_notifications(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<NotificationsResponse>, AppError> {
    let notifications = state.notifier.list(session.user.id).await?;

    Ok(Json(NotificationsResponse {
        success: true,
        notifications,
    }))
}

/// Mark one notification as read.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:5000/api/notifications/<id>/read \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn mark_read(
    session: SessionUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let notification_id = parse_id(&notification_id, "Notification not found")?;

    state
        .notifier
        .mark_read(session.user.id, notification_id)
        .await?;

    Ok(Json(MessageResponse::ok("Notification marked as read")))
}

/// Mark every notification of the caller as read.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:5000/api/notifications/read-all \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn mark_all_read(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<MarkAllResponse>, AppError> {
    let updated = state.notifier.mark_all_read(session.user.id).await?;

    Ok(Json(MarkAllResponse {
        success: true,
        updated,
    }))
}
