//! Request tracking middleware.
//!
//! [`correlation_id_layer`] wraps every request so that:
//!
//! - it carries a [`CorrelationId`] in its extensions, taken from the
//!   `X-Correlation-ID` header when that holds a UUID, fresh otherwise
//! - handlers run inside an `http_request` span tagged with the id, method
//!   and path
//! - the response echoes the id and the outcome lands in
//!   `fitbook_http_requests_total{method, status}`
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use fitbook_web::middleware::correlation_id_layer;
//!
//! let app = Router::new()
//!     .route("/api/classes", get(list_classes))
//!     .layer(correlation_id_layer());
//! ```

use crate::extractors::CorrelationId;
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Correlation id sent by the client, if it is a valid UUID.
pub(crate) fn correlation_id_from(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Layer that tags every request with a correlation id.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// See [`correlation_id_layer`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdService { inner }
    }
}

/// Service produced by [`CorrelationIdLayer`].
#[derive(Clone, Debug)]
pub struct CorrelationIdService<S> {
    inner: S,
}

impl<S, B> Service<Request> for CorrelationIdService<S>
where
    S: Service<Request, Response = Response<B>> + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response<B>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<B>, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let id = correlation_id_from(req.headers()).unwrap_or_else(Uuid::new_v4);
        req.extensions_mut().insert(CorrelationId(id));

        let method = req.method().as_str().to_owned();
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %id,
            method = %method,
            path = %req.uri().path(),
        );
        let started = Instant::now();
        let pending = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = pending.await?;
                let status = response.status();

                tracing::debug!(
                    status = status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Request finished"
                );
                metrics::counter!(
                    "fitbook_http_requests_total",
                    "method" => method,
                    "status" => status.as_u16().to_string()
                )
                .increment(1);

                if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
