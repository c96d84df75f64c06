//! # Fitbook Core
//!
//! Domain types and ports for the Fitbook class booking service.
//!
//! This crate holds everything the booking-consistency subsystem agrees on
//! without depending on a concrete database or web framework:
//!
//! - **Entities**: [`User`](types::User), [`Class`](types::Class),
//!   [`Booking`](types::Booking), [`Notification`](types::Notification)
//! - **Error taxonomy**: [`BookingError`](error::BookingError), one variant per
//!   failure kind surfaced to callers
//! - **Entity Store port**: [`EntityStore`](store::EntityStore), the storage
//!   contract including the two hard guarantees the engine relies on
//!   (unique `(user, class)` bookings and the conditional participant add)
//! - **Identity port**: [`IdentityVerifier`](identity::IdentityVerifier),
//!   bearer credential to user id
//! - **Environment**: [`Clock`](environment::Clock) for deterministic time
//!
//! ## Implementations
//!
//! - `PostgresEntityStore` (in `fitbook-postgres`): production storage
//! - `InMemoryEntityStore` (in `fitbook-testing`): fast, deterministic tests

pub mod error;
pub mod identity;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use error::BookingError;
pub use identity::{IdentityError, IdentityVerifier};
pub use store::{BookingFilter, ClassFilter, EntityStore, ParticipantAdd, StoreError, StoreFuture};
pub use types::*;

/// Environment module - Dependency injection traits
///
/// All time-dependent behaviour goes through [`Clock`](environment::Clock) so
/// tests can pin timestamps.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use fitbook_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
