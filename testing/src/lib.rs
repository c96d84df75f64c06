//! # Fitbook Testing
//!
//! Testing utilities for the Fitbook booking service.
//!
//! This crate provides:
//! - [`InMemoryEntityStore`]: `HashMap`-backed store with failure injection
//! - [`StaticIdentityVerifier`]: token map standing in for the session backend
//! - [`FixedClock`]: deterministic time
//! - [`fixtures`]: builders for users, classes, bookings and notifications
//! - [`properties`]: proptest strategies for domain values
//!
//! ## Example
//!
//! ```ignore
//! use fitbook_testing::{InMemoryEntityStore, fixtures, test_clock};
//!
//! #[tokio::test]
//! async fn test_booking_flow() {
//!     let store = Arc::new(InMemoryEntityStore::new());
//!     let engine = BookingEngine::new(store.clone(), Arc::new(test_clock()));
//!     let instructor = fixtures::instructor("Ada");
//!     let class = fixtures::class_by(&instructor, 10);
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use fitbook_core::environment::Clock;

pub mod entity_store;
pub mod fixtures;
pub mod identity;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use fitbook_testing::mocks::FixedClock;
    /// use fitbook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default(),
        )
    }
}

/// Test helpers
pub mod helpers {
    /// Install a `tracing` subscriber writing to the test harness.
    ///
    /// Safe to call from every test; only the first call installs anything.
    /// Honours `RUST_LOG`, defaulting to `warn`.
    pub fn init_test_tracing() {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use fitbook_core::types::Category;
    use proptest::prelude::*;

    /// Any class category.
    pub fn category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Cardio),
            Just(Category::Flexibility),
            Just(Category::StrengthTraining),
            Just(Category::Yoga),
            Just(Category::Meditation),
        ]
    }

    /// A small class capacity, 1 to 8 seats.
    pub fn capacity() -> impl Strategy<Value = u32> {
        1u32..=8
    }

    /// A short non-empty place name.
    pub fn place() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{2,10}( Hall| Studio)?"
    }
}

// Re-export commonly used items
pub use entity_store::InMemoryEntityStore;
pub use helpers::init_test_tracing;
pub use identity::StaticIdentityVerifier;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
