//! Router configuration for the booking service.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{bookings, classes, notifications, users};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use fitbook_web::correlation_id_layer;
use fitbook_web::handlers::{health_check, readiness_check};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Configures all routes including:
/// - Health checks
/// - Booking endpoints
/// - Class endpoints
/// - Notification endpoints
/// - User endpoints
///
/// Every request gets a correlation id and an HTTP trace span.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Bookings
        .route("/bookings/book-class", post(bookings::book_class))
        .route("/bookings/my-bookings", get(bookings::my_bookings))
        .route("/bookings/:id/cancel", put(bookings::cancel_booking))
        .route(
            "/bookings/class/:class_id/cancel",
            put(bookings::cancel_class_booking),
        )
        .route("/bookings/:id", delete(bookings::delete_booking))
        // Classes
        .route(
            "/classes",
            get(classes::list_classes).post(classes::create_class),
        )
        .route(
            "/classes/instructor-classes",
            get(classes::instructor_classes),
        )
        .route("/classes/my-classes", get(classes::my_classes))
        .route(
            "/classes/:id",
            put(classes::update_class).delete(classes::delete_class),
        )
        .route("/classes/:id/book", post(classes::book_listed_class))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/:id/read", put(notifications::mark_read))
        // Users
        .route("/users/profile", get(users::profile))
        .route(
            "/users/upgrade-to-instructor",
            put(users::upgrade_to_instructor),
        );

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(correlation_id_layer()),
        )
        .with_state(state)
}
