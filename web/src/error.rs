//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Every error leaves
//! the service as the same JSON envelope:
//!
//! ```json
//! { "success": false, "message": "Class is full" }
//! ```
//!
//! Server errors additionally carry an `error` field with the underlying
//! failure text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fitbook_core::BookingError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Data>, AppError> {
///     let class = store.get_class(id).await?
///         .ok_or_else(|| AppError::not_found("Class not found"))?;
///     Ok(Json(class))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Short label for logs and metrics
    code: &'static str,
    /// Failure detail exposed as `error` in the response body
    detail: Option<String>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            detail: None,
            source: None,
        }
    }

    /// Attach a detail string, returned to the client as `error`.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHORIZED")
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message.into(), "FORBIDDEN")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.into(), "NOT_FOUND")
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE",
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            let source = self.source.as_ref().map(ToString::to_string).unwrap_or_default();
            tracing::error!(
                status = %self.status,
                code = self.code,
                message = %self.message,
                detail = self.detail.as_deref().unwrap_or_default(),
                error = %source,
                "Internal server error"
            );
        } else {
            tracing::debug!(status = %self.status, code = self.code, message = %self.message, "Request rejected");
        }

        metrics::counter!("fitbook_http_errors_total", "code" => self.code).increment(1);

        let body = ErrorResponse {
            success: false,
            message: self.message,
            error: self.detail,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map the domain taxonomy onto HTTP statuses.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Unauthorized(message) => Self::unauthorized(message),
            BookingError::Forbidden(message) => Self::forbidden(message),
            BookingError::NotFound(message) => Self::not_found(message),
            BookingError::Invalid(message) => Self::bad_request(message),
            BookingError::Conflict(message) => Self::conflict(message),
            BookingError::Internal(source) => {
                Self::internal("Internal server error").with_detail(source.to_string())
            }
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fitbook_core::StoreError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("All fields are required");
        assert_eq!(err.to_string(), "[BAD_REQUEST] All fields are required");
    }

    #[test]
    fn test_booking_errors_map_to_statuses() {
        let cases = [
            (BookingError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (BookingError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (BookingError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (BookingError::Invalid("x".into()), StatusCode::BAD_REQUEST),
            (BookingError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                BookingError::Internal(StoreError::Database("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_envelope_omits_error_for_client_failures() {
        let (status, body) = body_json(AppError::conflict("Class is full")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "message": "Class is full" })
        );
    }

    #[tokio::test]
    async fn test_envelope_carries_detail_for_server_failures() {
        let err = AppError::from(BookingError::Internal(StoreError::Database(
            "connection reset".into(),
        )));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["error"], "Database error: connection reset");
    }
}
