//! API endpoints for the booking service.
//!
//! This module contains all HTTP API handlers organized by domain:
//! - Bookings: book, cancel, delete, list my bookings
//! - Classes: catalogue, instructor CRUD, book by class id
//! - Notifications: inbox and read markers
//! - Users: profile and instructor upgrade
//!
//! Successful responses carry `success: true`; failures use the
//! [`AppError`] envelope.

use fitbook_web::AppError;
use serde::Serialize;
use std::str::FromStr;

pub mod bookings;
pub mod classes;
pub mod notifications;
pub mod users;

pub use bookings::{book_class, cancel_booking, cancel_class_booking, delete_booking, my_bookings};
pub use classes::{
    book_listed_class, create_class, delete_class, instructor_classes, list_classes, my_classes,
    update_class,
};
pub use notifications::{list_notifications, mark_all_read, mark_read};
pub use users::{profile, upgrade_to_instructor};

/// `{ "success": true, "message": ... }`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always `true`
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// Parse an id from the path. Anything unparsable cannot name a record, so
/// it is reported as not found.
pub(crate) fn parse_id<T: FromStr>(raw: &str, not_found: &str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| AppError::not_found(not_found))
}
