//! Booking endpoints.

use super::{MessageResponse, parse_id};
use crate::auth::SessionUser;
use crate::engine::{BOOKING_NOT_FOUND, BookClassRequest, CLASS_NOT_FOUND, CancelMode, CancelTarget};
use crate::queries::MyBookings;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use fitbook_core::Booking;
use fitbook_web::{ApiJson, AppError};
use serde::Serialize;

/// `{ success, message, booking }`
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// Always `true`
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// The affected booking
    pub booking: Booking,
}

impl BookingResponse {
    pub(crate) fn new(message: &str, booking: Booking) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            booking,
        }
    }
}

/// `{ success, bookings, bookedClassIds }`
#[derive(Debug, Serialize)]
pub struct MyBookingsResponse {
    /// Always `true`
    pub success: bool,
    /// Listing
    #[serde(flatten)]
    pub listing: MyBookings,
}

/// Book a class.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/bookings/book-class \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "classId": "550e8400-e29b-41d4-a716-446655440000",
///     "className": "Yoga",
///     "date": "2025-02-01",
///     "time": "09:00",
///     "place": "Studio A"
///   }'
/// ```
pub async fn book_class(
    session: SessionUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BookClassRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = state.engine.book_class(session.user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::new("Class booked successfully", booking)),
    ))
}

/// Cancel a booking by id. The booking row is deleted.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:5000/api/bookings/<booking_id>/cancel \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn cancel_booking(
    session: SessionUser,
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let booking_id = parse_id(&booking_id, BOOKING_NOT_FOUND)?;

    state
        .engine
        .cancel_booking(
            session.user.id,
            CancelTarget::Booking(booking_id),
            CancelMode::Delete,
        )
        .await?;

    Ok(Json(MessageResponse::ok(
        "Booking cancelled and deleted successfully",
    )))
}

/// Cancel the caller's booking for a class. The row is kept as `cancelled`.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:5000/api/bookings/class/<class_id>/cancel \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn cancel_class_booking(
    session: SessionUser,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let class_id = parse_id(&class_id, CLASS_NOT_FOUND)?;

    let outcome = state
        .engine
        .cancel_booking(
            session.user.id,
            CancelTarget::Class(class_id),
            CancelMode::MarkCancelled,
        )
        .await?;

    Ok(Json(BookingResponse::new(
        "Booking cancelled successfully",
        outcome.booking,
    )))
}

/// Delete one of the caller's booking rows, whatever its status.
///
/// # Example
///
/// ```bash
/// curl -X DELETE http://localhost:5000/api/bookings/<booking_id> \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn delete_booking(
    session: SessionUser,
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let booking_id = parse_id(&booking_id, BOOKING_NOT_FOUND)?;

    state
        .engine
        .delete_booking(session.user.id, booking_id)
        .await?;

    Ok(Json(MessageResponse::ok("Booking deleted successfully")))
}

/// The caller's active bookings.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/api/bookings/my-bookings \
///   -H "Authorization: Bearer <token>"
/// ```
pub async fn my_bookings(
    session: SessionUser,
    State(state): State<AppState>,
) -> Result<Json<MyBookingsResponse>, AppError> {
    let listing = state.queries.list_my_bookings(session.user.id).await?;

    Ok(Json(MyBookingsResponse {
        success: true,
        listing,
    }))
}
