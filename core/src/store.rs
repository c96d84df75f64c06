//! Entity store port.
//!
//! The [`EntityStore`] trait is the persistence contract for users, classes,
//! bookings and notifications. Beyond plain CRUD it carries two guarantees the
//! booking engine depends on:
//!
//! - **Unique bookings**: at most one booking row exists per `(user, class)`
//!   pair. A second insert fails with [`StoreError::UniqueViolation`].
//! - **Conditional participant add**: [`EntityStore::add_participant`] adds a
//!   user to a class only if they are not already present and the class has a
//!   free seat, evaluated atomically against the stored record.
//!
//! # Implementations
//!
//! - `PostgresEntityStore` (in `fitbook-postgres`): production implementation
//! - `InMemoryEntityStore` (in `fitbook-testing`): fast, deterministic tests

use crate::types::{
    Booking, BookingId, BookingStatus, Class, ClassChanges, ClassId, Notification,
    NotificationId, Role, User, UserId,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Database connection or query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored value could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Boxed future returned by every store operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Outcome of a conditional participant add.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParticipantAdd {
    /// The user now holds a seat; carries the updated class.
    Added(Class),
    /// The user was already a participant. Nothing changed.
    AlreadyPresent,
    /// Every seat is taken. Nothing changed.
    Full,
    /// No such class.
    ClassMissing,
}

/// Filter for [`EntityStore::list_classes`]. Empty fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassFilter {
    /// Only classes authored by this instructor
    pub instructor: Option<UserId>,
    /// Only classes this user holds a seat in
    pub participant: Option<UserId>,
}

impl ClassFilter {
    /// Whether `class` passes the filter.
    #[must_use]
    pub fn matches(&self, class: &Class) -> bool {
        self.instructor.is_none_or(|id| class.instructor == id)
            && self.participant.is_none_or(|id| class.has_participant(id))
    }
}

/// Filter for [`EntityStore::list_bookings`]. Empty fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Only bookings held by this user
    pub user: Option<UserId>,
    /// Only bookings for this class
    pub class: Option<ClassId>,
    /// Only bookings in this status
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    /// Whether `booking` passes the filter.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.user.is_none_or(|id| booking.user_id == id)
            && self.class.is_none_or(|id| booking.class_id == id)
            && self.status.is_none_or(|status| booking.status == status)
    }
}

/// Persistence contract for the booking service.
///
/// # Dyn Compatibility
///
/// Methods return [`StoreFuture`] rather than using `async fn` so the store can
/// be shared as `Arc<dyn EntityStore>` across request handlers.
///
/// # Ordering
///
/// - [`list_classes`](Self::list_classes) returns classes ascending by date, then time.
/// - [`list_bookings`](Self::list_bookings) and
///   [`list_notifications`](Self::list_notifications) return newest first.
pub trait EntityStore: Send + Sync {
    /// Check connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] when the backend is unreachable.
    fn ping(&self) -> StoreFuture<'_, ()>;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if the id or email is taken.
    fn insert_user(&self, user: User) -> StoreFuture<'_, ()>;

    /// Load a user by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the query fails.
    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>>;

    /// Change a user's role, returning the updated user.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn set_user_role(&self, id: UserId, role: Role) -> StoreFuture<'_, Option<User>>;

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    /// Insert a class.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn insert_class(&self, class: Class) -> StoreFuture<'_, ()>;

    /// Load a class by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the query fails.
    fn get_class(&self, id: ClassId) -> StoreFuture<'_, Option<Class>>;

    /// Apply descriptive changes to a class, returning the updated class.
    ///
    /// Never touches participants or capacity.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn update_class(
        &self,
        id: ClassId,
        changes: ClassChanges,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Class>>;

    /// Delete a class. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn delete_class(&self, id: ClassId) -> StoreFuture<'_, bool>;

    /// List classes matching `filter`, ascending by date then time.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the query fails.
    fn list_classes(&self, filter: ClassFilter) -> StoreFuture<'_, Vec<Class>>;

    /// Add `user` to the participants of `class` if absent and a seat is free.
    ///
    /// The presence and capacity checks and the write happen as one atomic step
    /// against the stored record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn add_participant(&self, class: ClassId, user: UserId) -> StoreFuture<'_, ParticipantAdd>;

    /// Remove `user` from the participants of `class`. Returns whether they were present.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn remove_participant(&self, class: ClassId, user: UserId) -> StoreFuture<'_, bool>;

    // ------------------------------------------------------------------
    // Bookings
    // ------------------------------------------------------------------

    /// Insert a booking row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if a row for the same
    /// `(user, class)` pair already exists.
    fn insert_booking(&self, booking: Booking) -> StoreFuture<'_, ()>;

    /// Load a booking by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the query fails.
    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>>;

    /// Load the booking row for a `(user, class)` pair, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the query fails.
    fn find_booking(&self, user: UserId, class: ClassId) -> StoreFuture<'_, Option<Booking>>;

    /// Change a booking's status, returning the updated row.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn set_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> StoreFuture<'_, Option<Booking>>;

    /// Delete a booking row. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn delete_booking(&self, id: BookingId) -> StoreFuture<'_, bool>;

    /// Delete every booking row for a class. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn delete_bookings_for_class(&self, class: ClassId) -> StoreFuture<'_, u64>;

    /// List bookings matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the query fails.
    fn list_bookings(&self, filter: BookingFilter) -> StoreFuture<'_, Vec<Booking>>;

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Insert a notification.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn insert_notification(&self, notification: Notification) -> StoreFuture<'_, ()>;

    /// List a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the query fails.
    fn list_notifications(&self, user: UserId) -> StoreFuture<'_, Vec<Notification>>;

    /// Mark one notification read if it belongs to `user`. Returns whether it matched.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn mark_notification_read(&self, id: NotificationId, user: UserId) -> StoreFuture<'_, bool>;

    /// Mark every unread notification of `user` read. Returns the number changed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    fn mark_all_notifications_read(&self, user: UserId) -> StoreFuture<'_, u64>;
}
