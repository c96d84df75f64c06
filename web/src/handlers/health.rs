//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, extract::State, http::StatusCode};
use fitbook_core::EntityStore;
use serde::Serialize;
use std::sync::Arc;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Readiness {
    /// `ready` or `unavailable`
    pub status: &'static str,
    /// Failure detail when the store is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness check: pings the entity store.
///
/// Works with any router state `S` for which `Arc<dyn EntityStore>: FromRef<S>`.
///
/// # Status Codes
///
/// - 200 OK: store reachable
/// - 503 Service Unavailable: store ping failed
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness_check(
    State(store): State<Arc<dyn EntityStore>>,
) -> (StatusCode, Json<Readiness>) {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Readiness {
                status: "ready",
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Readiness {
                    status: "unavailable",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitbook_testing::InMemoryEntityStore;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readiness_with_reachable_store() {
        let store: Arc<dyn EntityStore> = Arc::new(InMemoryEntityStore::new());
        let (status, Json(body)) = readiness_check(State(store)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
    }
}
