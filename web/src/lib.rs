//! Axum integration for the Fitbook booking service.
//!
//! This crate holds the HTTP glue shared by Fitbook services:
//!
//! - [`AppError`]: maps [`BookingError`](fitbook_core::BookingError) onto
//!   status codes and the `{success: false, message, error?}` JSON envelope
//! - [`extractors`]: correlation id, bearer credential and JSON body extraction
//! - [`middleware`]: correlation id propagation and request spans
//! - [`handlers`]: liveness and readiness endpoints
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives and gets a correlation id
//! 2. **Extract** the bearer credential and JSON body
//! 3. **Call** the booking engine or lifecycle manager
//! 4. **Map** `BookingError` into `AppError`, or the result into JSON
//!
//! # Example
//!
//! ```ignore
//! use fitbook_web::{ApiJson, AppError, BearerToken};
//! use axum::{Router, routing::post, Json};
//!
//! async fn book(
//!     State(state): State<AppState>,
//!     token: BearerToken,
//!     ApiJson(request): ApiJson<BookClassRequest>,
//! ) -> Result<Json<Booking>, AppError> {
//!     let user = state.authenticate(&token).await?;
//!     Ok(Json(state.engine.book_class(user.id, request).await?))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
