//! Application state for the booking HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Entity store (readiness checks, direct lookups)
//! - Identity verifier (bearer credential to user)
//! - Booking engine, class lifecycle, notifier, queries and user service

use crate::config::BookingConfig;
use crate::engine::BookingEngine;
use crate::lifecycle::ClassLifecycle;
use crate::locks::ClassLocks;
use crate::notifications::Notifier;
use crate::queries::Queries;
use crate::users::UserService;
use axum::extract::FromRef;
use fitbook_core::environment::Clock;
use fitbook_core::{EntityStore, IdentityVerifier};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is a cheap `Arc` clone.
#[derive(Clone)]
pub struct AppState {
    /// Entity store shared by every component
    pub store: Arc<dyn EntityStore>,
    /// Resolves bearer credentials
    pub identity: Arc<dyn IdentityVerifier>,
    /// Booking and cancellation
    pub engine: BookingEngine,
    /// Class create/update/delete
    pub lifecycle: ClassLifecycle,
    /// Notification inbox
    pub notifier: Notifier,
    /// Read-side listings
    pub queries: Queries,
    /// Profiles and role upgrades
    pub users: UserService,
}

impl AppState {
    /// Wire every component around one store, one clock and one lock table.
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        identity: Arc<dyn IdentityVerifier>,
        clock: Arc<dyn Clock>,
        booking: BookingConfig,
    ) -> Self {
        let locks = ClassLocks::new();
        let notifier = Notifier::new(Arc::clone(&store), Arc::clone(&clock));

        Self {
            engine: BookingEngine::new(
                Arc::clone(&store),
                notifier.clone(),
                locks.clone(),
                Arc::clone(&clock),
            ),
            lifecycle: ClassLifecycle::new(
                Arc::clone(&store),
                locks,
                clock,
                booking.default_max_participants,
            ),
            queries: Queries::new(Arc::clone(&store)),
            users: UserService::new(Arc::clone(&store)),
            notifier,
            identity,
            store,
        }
    }
}

// Lets the shared readiness handler pull the store out of AppState.
impl FromRef<AppState> for Arc<dyn EntityStore> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.store)
    }
}
