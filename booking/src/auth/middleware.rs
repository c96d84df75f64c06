//! Authentication extractor for the booking API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use booking::auth::SessionUser;
//!
//! async fn profile(session: SessionUser) -> Json<User> {
//!     // session.user is loaded fresh from the store for this request
//!     Json(session.user)
//! }
//! ```

use crate::server::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use fitbook_core::{IdentityError, User};
use fitbook_web::{AppError, BearerToken};

/// Rejection for a credential the verifier does not accept.
pub const INVALID_TOKEN: &str = "Token is not valid";

/// Authenticated user.
///
/// Extracts the bearer credential, verifies it and loads the user it belongs
/// to. Use this as a handler parameter to require authentication.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The authenticated user, as currently stored
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let user_id = state.identity.verify(&token).await.map_err(|e| match e {
            IdentityError::InvalidToken | IdentityError::Expired => {
                tracing::debug!(reason = %e, "Credential rejected");
                AppError::unauthorized(INVALID_TOKEN)
            }
            IdentityError::Backend(detail) => {
                AppError::unavailable("Authentication backend unavailable").with_detail(detail)
            }
        })?;

        let user = state.users.resolve(user_id).await?;
        tracing::debug!(user_id = %user.id, role = user.role.as_str(), "Request authenticated");

        Ok(Self { user })
    }
}
