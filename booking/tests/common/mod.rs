//! Shared setup for booking integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use booking::config::BookingConfig;
use booking::{AppState, BookClassRequest};
use fitbook_core::{
    Booking, BookingError, BookingFilter, BookingStatus, Class, ClassFilter, EntityStore, User,
};
use fitbook_testing::{InMemoryEntityStore, StaticIdentityVerifier, fixtures, test_clock};
use std::collections::HashSet;
use std::sync::Arc;

/// Application wired against the in-memory store.
pub struct TestApp {
    pub store: Arc<InMemoryEntityStore>,
    pub identity: Arc<StaticIdentityVerifier>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        fitbook_testing::init_test_tracing();
        let store = Arc::new(InMemoryEntityStore::new());
        let identity = Arc::new(StaticIdentityVerifier::new());
        let state = AppState::new(
            store.clone(),
            identity.clone(),
            Arc::new(test_clock()),
            BookingConfig::default(),
        );
        Self {
            store,
            identity,
            state,
        }
    }

    pub async fn member(&self, name: &str) -> User {
        let user = fixtures::member(name);
        self.store.insert_user(user.clone()).await.unwrap();
        user
    }

    pub async fn instructor(&self, name: &str) -> User {
        let user = fixtures::instructor(name);
        self.store.insert_user(user.clone()).await.unwrap();
        user
    }

    /// A class owned by `instructor`, stored directly.
    pub async fn class(&self, instructor: &User, capacity: u32) -> Class {
        let class = fixtures::class_by(instructor, capacity);
        self.store.insert_class(class.clone()).await.unwrap();
        class
    }

    pub fn token(&self, user: &User) -> String {
        self.identity.issue(user.id)
    }

    pub async fn book(&self, user: &User, class: &Class) -> Result<Booking, BookingError> {
        self.state
            .engine
            .book_class(user.id, BookClassRequest::for_class(class))
            .await
    }

    pub async fn reload(&self, class: &Class) -> Class {
        self.store.get_class(class.id).await.unwrap().expect("class exists")
    }

    pub async fn active_bookings(&self, class: &Class) -> Vec<Booking> {
        self.store
            .list_bookings(BookingFilter {
                class: Some(class.id),
                status: Some(BookingStatus::Booked),
                ..BookingFilter::default()
            })
            .await
            .unwrap()
    }

    /// Check the capacity bound, single active booking and pairing invariants
    /// across the whole store.
    pub async fn assert_consistent(&self) {
        let classes = self.store.list_classes(ClassFilter::default()).await.unwrap();
        let bookings = self.store.all_bookings();

        let mut active_pairs = HashSet::new();
        for booking in bookings.iter().filter(|b| b.is_active()) {
            assert!(
                active_pairs.insert((booking.user_id, booking.class_id)),
                "two active bookings for user {} in class {}",
                booking.user_id,
                booking.class_id
            );
        }

        for class in &classes {
            assert!(
                class.participants.len() <= class.max_participants as usize,
                "class {} over capacity: {} > {}",
                class.id,
                class.participants.len(),
                class.max_participants
            );

            let unique: HashSet<_> = class.participants.iter().collect();
            assert_eq!(unique.len(), class.participants.len(), "duplicate participant");

            for participant in &class.participants {
                assert!(
                    active_pairs.contains(&(*participant, class.id)),
                    "participant {participant} in class {} has no active booking",
                    class.id
                );
            }
        }

        for (user, class_id) in &active_pairs {
            let class = classes
                .iter()
                .find(|c| c.id == *class_id)
                .unwrap_or_else(|| panic!("active booking for missing class {class_id}"));
            assert!(
                class.has_participant(*user),
                "active booking of {user} in class {class_id} has no seat"
            );
        }
    }
}
