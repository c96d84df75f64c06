//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation id, as set by
//!   [`correlation_id_layer`](crate::middleware::correlation_id_layer) or
//!   taken from the `X-Correlation-ID` header
//! - [`BearerToken`]: the credential from `Authorization: Bearer <token>`
//! - [`ApiJson`]: a JSON body whose rejections use the [`AppError`] envelope
//!
//! # Examples
//!
//! ```ignore
//! use fitbook_web::extractors::{BearerToken, CorrelationId};
//!
//! async fn handler(correlation_id: CorrelationId, token: BearerToken) -> String {
//!     tracing::info!(correlation_id = %correlation_id.0, "Processing request");
//!     format!("{} bytes of credential", token.0.len())
//! }
//! ```

use crate::error::AppError;
use crate::middleware::correlation_id_from;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Message returned when a request body cannot be read as the expected JSON.
pub const INVALID_BODY: &str = "Invalid request body";

/// Correlation ID for request tracing.
///
/// Prefers the id stored in request extensions by the middleware, then the
/// `X-Correlation-ID` header, and generates a new UUID v4 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        Ok(Self(
            correlation_id_from(&parts.headers).unwrap_or_else(Uuid::new_v4),
        ))
    }
}

/// Bearer credential from the `Authorization` header.
///
/// A missing header rejects with 401 "No authentication token, authorization
/// denied". The `Bearer ` prefix is optional; whatever follows is passed on
/// verbatim to the identity verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::unauthorized("No authentication token, authorization denied"))?;

        let token = raw.strip_prefix("Bearer ").map_or(raw, str::trim_start);
        if token.is_empty() {
            return Err(AppError::unauthorized(
                "No authentication token, authorization denied",
            ));
        }

        Ok(Self(token.to_string()))
    }
}

/// JSON request body.
///
/// Same as [`axum::Json`] except that malformed JSON, a wrong field type or a
/// missing `Content-Type: application/json` reject with a 400 in the
/// `{success: false, message}` envelope instead of axum's plain-text body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_rejected(&rejection)),
        }
    }
}

fn body_rejected(rejection: &JsonRejection) -> AppError {
    tracing::debug!(status = %rejection.status(), reason = %rejection.body_text(), "Request body rejected");
    AppError::bad_request(INVALID_BODY)
}
