//! Identity port: bearer credential to user id.
//!
//! Issuing credentials is out of scope for this service. The verifier only
//! answers "which user does this credential belong to".

use crate::types::UserId;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors returned by an [`IdentityVerifier`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The credential is unknown or malformed.
    #[error("Invalid token")]
    InvalidToken,

    /// The credential was valid but has expired.
    #[error("Token expired")]
    Expired,

    /// The verifier's backend failed.
    #[error("Identity backend error: {0}")]
    Backend(String),
}

/// Resolves a bearer credential to the id of the user it was issued to.
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the user it identifies.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::InvalidToken`] if the token is unknown
    /// - [`IdentityError::Expired`] if the token is past its expiry
    /// - [`IdentityError::Backend`] if the lookup itself failed
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserId, IdentityError>> + Send + 'a>>;
}
