//! Error taxonomy for booking operations.

use crate::store::StoreError;
use thiserror::Error;

/// Failure of a booking, cancellation, class lifecycle or query operation.
///
/// Each variant corresponds to one response class at the HTTP boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Missing or invalid credential, or the verified user no longer exists
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Referenced class, booking or notification does not exist
    #[error("{0}")]
    NotFound(String),

    /// Request failed validation or references inconsistent data
    #[error("{0}")]
    Invalid(String),

    /// Request conflicts with current state (already booked, class full)
    #[error("{0}")]
    Conflict(String),

    /// Storage failure
    #[error("Storage error: {0}")]
    Internal(#[from] StoreError),
}

impl BookingError {
    /// Short machine-readable label, used for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Invalid(_) => "invalid",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;
