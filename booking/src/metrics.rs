//! Business metrics for the booking service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `fitbook_bookings_total{outcome}` - Booking attempts by outcome
//!   (booked, conflict, not_found, invalid, internal)
//! - `fitbook_booking_repairs_total{kind}` - Participant/booking discrepancies repaired
//! - `fitbook_cancellations_total{mode}` - Cancellations by treatment (delete, mark_cancelled)
//! - `fitbook_classes_total{op}` - Class lifecycle operations (create, update, delete)
//! - `fitbook_notifications_failed_total` - Notification writes that were dropped
//! - `fitbook_http_errors_total{code}` - Error responses, recorded by `fitbook-web`
//! - `fitbook_http_requests_total{method, status}` - Every request, recorded by
//!   the correlation-id layer in `fitbook-web`
//!
//! The Prometheus recorder is installed by [`install_prometheus`]; without it
//! every `record_*` call is a no-op.

use metrics::describe_counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`BuildError`] if a recorder is already installed or the
/// listener cannot be set up.
pub fn install_prometheus(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "fitbook_bookings_total",
        "Total booking attempts by outcome (booked, conflict, not_found, invalid, internal)"
    );
    describe_counter!(
        "fitbook_booking_repairs_total",
        "Discrepancies between class participants and active bookings that were repaired"
    );
    describe_counter!(
        "fitbook_cancellations_total",
        "Total cancellations by treatment (delete, mark_cancelled)"
    );
    describe_counter!(
        "fitbook_classes_total",
        "Class lifecycle operations (create, update, delete)"
    );
    describe_counter!(
        "fitbook_notifications_failed_total",
        "Notifications that could not be stored"
    );
    describe_counter!(
        "fitbook_http_errors_total",
        "Error responses by error code"
    );
    describe_counter!(
        "fitbook_http_requests_total",
        "HTTP requests by method and status"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record the outcome of a booking attempt.
///
/// # Arguments
///
/// * `outcome` - `booked`, or the error kind that rejected the attempt
pub fn record_booking(outcome: &'static str) {
    metrics::counter!("fitbook_bookings_total", "outcome" => outcome).increment(1);
    tracing::debug!(outcome, "Recorded booking metric");
}

/// Record a repaired discrepancy (`orphan_participant`, `relinked_booking`,
/// `unseatable_booking`).
pub fn record_repair(kind: &'static str) {
    metrics::counter!("fitbook_booking_repairs_total", "kind" => kind).increment(1);
    tracing::debug!(kind, "Recorded booking_repair metric");
}

/// Record a cancellation.
pub fn record_cancellation(mode: &'static str) {
    metrics::counter!("fitbook_cancellations_total", "mode" => mode).increment(1);
    tracing::debug!(mode, "Recorded cancellation metric");
}

/// Record a class lifecycle operation.
pub fn record_class_operation(op: &'static str) {
    metrics::counter!("fitbook_classes_total", "op" => op).increment(1);
    tracing::debug!(op, "Recorded class_operation metric");
}

/// Record a notification that was dropped.
pub fn record_notification_failed() {
    metrics::counter!("fitbook_notifications_failed_total").increment(1);
    tracing::debug!("Recorded notification_failed metric");
}
