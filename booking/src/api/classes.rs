//! Class endpoints: public catalogue, instructor management and booking by id.

use super::bookings::BookingResponse;
use super::parse_id;
use crate::auth::SessionUser;
use crate::engine::CLASS_NOT_FOUND;
use crate::lifecycle::{ClassAction, NewClass, ensure_instructor};
use crate::queries::ClassView;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use fitbook_core::{Class, ClassChanges};
use fitbook_web::{ApiJson, AppError};
use serde::Serialize;

/// `{ success, message?, class }`
#[derive(Debug, Serialize)]
pub struct ClassResponse {
    /// Always `true`
    pub success: bool,
    /// Human-readable outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The class as stored
    pub class: Class,
}

/// `{ success, classes }`
#[derive(Debug, Serialize)]
pub struct ClassesResponse {
    /// Always `true`
    pub success: bool,
    /// Classes ordered by date then time
    pub classes: Vec<Class>,
}

/// `{ success, message, deletedBookings }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteClassResponse {
    /// Always `true`
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Booking rows purged with the class
    pub deleted_bookings: u64,
}

/// Every class. Public endpoint - no authentication required.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/api/classes
/// ```
pub async fn list_classes(State(state): State<AppState>) -> Result<Json<Vec<ClassView>>, AppError> {
    Ok(Json(state.queries.list_all_classes().await?))
}

/// Classes the caller holds a seat in.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/api/classes/my-classes \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn my_classes(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassView>>, AppError> {
    Ok(Json(state.queries.list_my_classes(session.user.id).await?))
}

/// Classes created by the calling instructor.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/api/classes/instructor-classes \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn instructor_classes(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<ClassesResponse>, AppError> {
    let classes = state.queries.list_instructor_classes(&session.user).await?;

    Ok(Json(ClassesResponse {
        success: true,
        classes,
    }))
}

/// Create a class. Instructors only.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/classes \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "category": "Strength Training",
///     "exerciseType": "Kettlebells",
///     "date": "2025-02-01",
///     "time": "18:30",
///     "place": "Room 2",
///     "maxParticipants": 12
///   }'
/// ```
pub async fn create_class(
    session: SessionUser,
    State(state): State<AppState>,
    body: Result<ApiJson<NewClass>, AppError>,
) -> Result<(StatusCode, Json<ClassResponse>), AppError> {
    // Members are turned away before their payload is looked at.
    ensure_instructor(&session.user, ClassAction::Create)?;
    let ApiJson(new) = body?;
    let class = state.lifecycle.create_class(&session.user, new).await?;

    Ok((
        StatusCode::CREATED,
        Json(ClassResponse {
            success: true,
            message: Some("Class created successfully".to_string()),
            class,
        }),
    ))
}

/// Edit category, exercise type, date, time or place of the caller's class.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:5000/api/classes/<class_id> \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{"place": "Studio B"}'
/// ```
pub async fn update_class(
    session: SessionUser,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    body: Result<ApiJson<ClassChanges>, AppError>,
) -> Result<Json<ClassResponse>, AppError> {
    ensure_instructor(&session.user, ClassAction::Update)?;
    let ApiJson(changes) = body?;
    let class_id = parse_id(&class_id, CLASS_NOT_FOUND)?;
    let class = state
        .lifecycle
        .update_class(&session.user, class_id, changes)
        .await?;

    Ok(Json(ClassResponse {
        success: true,
        message: None,
        class,
    }))
}

/// Delete the caller's class and every booking for it.
///
/// # Example
///
/// ```bash
/// curl -X DELETE http://localhost:5000/api/classes/<class_id> \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn delete_class(
    session: SessionUser,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Json<DeleteClassResponse>, AppError> {
    let class_id = parse_id(&class_id, CLASS_NOT_FOUND)?;
    let deleted_bookings = state
        .lifecycle
        .delete_class(&session.user, class_id)
        .await?;

    Ok(Json(DeleteClassResponse {
        success: true,
        message: "Class and related bookings deleted successfully".to_string(),
        deleted_bookings,
    }))
}

/// Book a class straight from the catalogue.
///
/// Same rules as `POST /api/bookings/book-class`; the booking is named after
/// the class's category.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/classes/<class_id>/book \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn book_listed_class(
    session: SessionUser,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let class_id = parse_id(&class_id, CLASS_NOT_FOUND)?;
    let booking = state
        .engine
        .book_listed_class(session.user.id, class_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::new("Class booked successfully", booking)),
    ))
}
