//! Booking consistency engine.
//!
//! The engine owns the pairing between a class's `participants` and the
//! active bookings for that class: a user is a participant exactly when they
//! hold a booking with status `booked`. Every write that touches either side
//! runs under the class's lock from [`ClassLocks`], and the storage layer's
//! conditional add and unique `(user, class)` index back that up across
//! processes.
//!
//! # Booking
//!
//! ```text
//! validate ─► lock class ─► load class + instructor ─► reconcile existing state
//!          ─► capacity check ─► conditional add ─► write booking ─► unlock ─► notify
//!                                     ▲                  │
//!                                     └── compensate ◄───┘ (write failed)
//! ```
//!
//! A discrepancy found while reconciling (a participant with no active
//! booking, or an active booking with no participant entry) is repaired on
//! the spot and counted in `fitbook_booking_repairs_total`.

use crate::locks::ClassLocks;
use crate::metrics;
use crate::notifications::Notifier;
use fitbook_core::environment::Clock;
use fitbook_core::error::Result;
use fitbook_core::{
    Booking, BookingError, BookingId, BookingStatus, Class, ClassId, EntityStore, ParticipantAdd,
    StoreError, UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

/// Rejection for a user who already holds the seat.
pub const ALREADY_BOOKED: &str = "You have already booked this class";
/// Rejection when every seat is taken.
pub const CLASS_FULL: &str = "Class is full";
/// Unknown class id.
pub const CLASS_NOT_FOUND: &str = "Class not found";
/// Unknown booking id, or not one of the caller's active bookings.
pub const BOOKING_NOT_FOUND: &str = "Booking not found";
/// A booking request with a blank field.
pub const FIELDS_REQUIRED: &str = "All fields are required";
/// The class's instructor no longer exists.
pub const INSTRUCTOR_MISSING: &str = "Instructor information not found";

/// Body of `POST /api/bookings/book-class`.
///
/// Every field must be present and non-blank. Only `class_id` and
/// `class_name` are used beyond validation: instructor, date, time and place
/// are snapshotted from the stored class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookClassRequest {
    /// Class to book
    #[serde(default)]
    pub class_id: String,
    /// Display name stored on the booking
    #[serde(default)]
    pub class_name: String,
    /// Session date as shown to the member
    #[serde(default)]
    pub date: String,
    /// Session time as shown to the member
    #[serde(default)]
    pub time: String,
    /// Session place as shown to the member
    #[serde(default)]
    pub place: String,
}

impl BookClassRequest {
    /// A request describing `class` as stored, named after its category.
    #[must_use]
    pub fn for_class(class: &Class) -> Self {
        Self {
            class_id: class.id.to_string(),
            class_name: class.category.to_string(),
            date: class.date.to_string(),
            time: class.time.clone(),
            place: class.place.clone(),
        }
    }

    /// Check that every field is filled in and resolve the class id.
    ///
    /// # Errors
    ///
    /// [`BookingError::Invalid`] when a field is blank, [`BookingError::NotFound`]
    /// when `class_id` cannot name a class.
    pub fn validate(&self) -> Result<(ClassId, String)> {
        let fields = [
            &self.class_id,
            &self.class_name,
            &self.date,
            &self.time,
            &self.place,
        ];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(BookingError::Invalid(FIELDS_REQUIRED.to_string()));
        }

        let class_id = self
            .class_id
            .trim()
            .parse()
            .map_err(|_| BookingError::NotFound(CLASS_NOT_FOUND.to_string()))?;

        Ok((class_id, self.class_name.trim().to_string()))
    }
}

/// Which active booking a cancellation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelTarget {
    /// By booking id
    Booking(BookingId),
    /// By the class the booking is for
    Class(ClassId),
}

/// What happens to the booking row on cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelMode {
    /// Remove the row
    Delete,
    /// Keep the row with status `cancelled`
    MarkCancelled,
}

impl CancelMode {
    /// Metric/log label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::MarkCancelled => "mark_cancelled",
        }
    }
}

/// Result of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOutcome {
    /// The booking as it was cancelled, status `cancelled`
    pub booking: Booking,
    /// How the row was treated
    pub mode: CancelMode,
}

fn not_found(message: &str) -> BookingError {
    BookingError::NotFound(message.to_string())
}

fn conflict(message: &str) -> BookingError {
    BookingError::Conflict(message.to_string())
}

/// Books and cancels seats while keeping participants and bookings paired.
#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn EntityStore>,
    notifier: Notifier,
    locks: ClassLocks,
    clock: Arc<dyn Clock>,
}

impl BookingEngine {
    /// Create an engine.
    ///
    /// `locks` must be shared with every other component that mutates
    /// participants (the class lifecycle manager).
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        notifier: Notifier,
        locks: ClassLocks,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            locks,
            clock,
        }
    }

    /// Book a seat in a class for `user_id`.
    ///
    /// On success the user is a participant of the class and holds exactly
    /// one active booking for it, and a confirmation notification has been
    /// attempted.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Invalid`]: blank field, or the class's instructor is gone
    /// - [`BookingError::NotFound`]: no such class
    /// - [`BookingError::Conflict`]: already booked, or the class is full
    /// - [`BookingError::Internal`]: storage failure (the seat is released again)
    pub async fn book_class(&self, user_id: UserId, request: BookClassRequest) -> Result<Booking> {
        let span = tracing::info_span!("book_class", %user_id, class_id = %request.class_id);

        let result = async {
            let (class_id, class_name) = request.validate()?;
            let booking = self.book_locked(user_id, class_id, class_name).await?;
            self.notifier.booking_confirmed(&booking).await;
            Ok::<_, BookingError>(booking)
        }
        .instrument(span)
        .await;

        match &result {
            Ok(booking) => {
                tracing::info!(%user_id, booking_id = %booking.id, class_id = %booking.class_id, "Class booked");
                metrics::record_booking("booked");
            }
            Err(BookingError::Internal(e)) => {
                tracing::error!(%user_id, error = %e, "Booking failed on storage");
                metrics::record_booking("internal");
            }
            Err(e) => {
                tracing::warn!(%user_id, reason = %e, "Booking rejected");
                metrics::record_booking(e.kind());
            }
        }

        result
    }

    /// Book a class by id, naming the booking after the class's category.
    ///
    /// # Errors
    ///
    /// As [`BookingEngine::book_class`].
    pub async fn book_listed_class(&self, user_id: UserId, class_id: ClassId) -> Result<Booking> {
        let class = self
            .store
            .get_class(class_id)
            .await?
            .ok_or_else(|| not_found(CLASS_NOT_FOUND))?;

        self.book_class(user_id, BookClassRequest::for_class(&class)).await
    }

    async fn book_locked(
        &self,
        user_id: UserId,
        class_id: ClassId,
        class_name: String,
    ) -> Result<Booking> {
        let _guard = self.locks.lock(class_id).await;

        let mut class = self
            .store
            .get_class(class_id)
            .await?
            .ok_or_else(|| not_found(CLASS_NOT_FOUND))?;

        let instructor = self
            .store
            .get_user(class.instructor)
            .await?
            .ok_or_else(|| BookingError::Invalid(INSTRUCTOR_MISSING.to_string()))?;

        let existing = self.store.find_booking(user_id, class_id).await?;
        let previous = self.reconcile(user_id, &mut class, existing).await?;

        if class.is_full() {
            return Err(conflict(CLASS_FULL));
        }

        match self.store.add_participant(class_id, user_id).await? {
            ParticipantAdd::Added(_) => {}
            ParticipantAdd::AlreadyPresent => return Err(conflict(ALREADY_BOOKED)),
            ParticipantAdd::Full => return Err(conflict(CLASS_FULL)),
            ParticipantAdd::ClassMissing => return Err(not_found(CLASS_NOT_FOUND)),
        }

        let written = match previous {
            Some(cancelled) => self.reactivate(cancelled, &class, &instructor.name, &class_name).await,
            None => self.insert_booking(user_id, &class, &instructor.name, class_name).await,
        };

        match written {
            Ok(booking) => Ok(booking),
            Err(e) => Err(self.settle_failed_write(class_id, user_id, e).await),
        }
    }

    /// Clean up after the booking write following a successful seat add failed.
    ///
    /// A unique violation means another writer holds a row for the pair; when
    /// that row is active the seat belongs to it and stays.
    async fn settle_failed_write(
        &self,
        class_id: ClassId,
        user_id: UserId,
        error: StoreError,
    ) -> BookingError {
        if !matches!(error, StoreError::UniqueViolation(_)) {
            self.release_seat(class_id, user_id).await;
            return error.into();
        }

        match self.store.find_booking(user_id, class_id).await {
            Ok(Some(winner)) if winner.is_active() => {
                tracing::warn!(%user_id, %class_id, booking_id = %winner.id, "Concurrent booking won; seat kept for it");
            }
            Ok(_) => self.release_seat(class_id, user_id).await,
            Err(e) => {
                tracing::error!(%user_id, %class_id, error = %e, "Could not check the winning booking; seat left for repair");
            }
        }
        conflict(ALREADY_BOOKED)
    }

    /// Bring participants and the existing booking back in line before booking.
    ///
    /// Returns the cancelled booking row to reuse, if any. Fails with
    /// `Conflict` whenever the user still holds an active booking afterwards.
    async fn reconcile(
        &self,
        user_id: UserId,
        class: &mut Class,
        existing: Option<Booking>,
    ) -> Result<Option<Booking>> {
        let seated = class.has_participant(user_id);

        match existing {
            Some(booking) if booking.is_active() => {
                if !seated {
                    self.relink(class, &booking).await?;
                }
                Err(conflict(ALREADY_BOOKED))
            }
            previous if !seated => Ok(previous),
            _ => {
                // The row may have been written since it was read; only a seat
                // with no active booking behind it is an orphan.
                match self.store.find_booking(user_id, class.id).await? {
                    Some(booking) if booking.is_active() => Err(conflict(ALREADY_BOOKED)),
                    current => {
                        tracing::warn!(%user_id, class_id = %class.id, "Removing participant entry with no active booking");
                        self.store.remove_participant(class.id, user_id).await?;
                        class.participants.retain(|id| *id != user_id);
                        metrics::record_repair("orphan_participant");
                        Ok(current)
                    }
                }
            }
        }
    }

    /// Give an active booking back the seat it lost.
    async fn relink(&self, class: &Class, booking: &Booking) -> Result<()> {
        match self.store.add_participant(class.id, booking.user_id).await? {
            ParticipantAdd::Added(_) | ParticipantAdd::AlreadyPresent => {
                tracing::warn!(booking_id = %booking.id, class_id = %class.id, "Re-linked active booking to its class");
                metrics::record_repair("relinked_booking");
                Ok(())
            }
            ParticipantAdd::Full => {
                tracing::warn!(booking_id = %booking.id, class_id = %class.id, "Active booking has no seat left; cancelling it");
                self.store
                    .set_booking_status(booking.id, BookingStatus::Cancelled)
                    .await?;
                metrics::record_repair("unseatable_booking");
                Err(conflict(CLASS_FULL))
            }
            ParticipantAdd::ClassMissing => Err(not_found(CLASS_NOT_FOUND)),
        }
    }

    async fn reactivate(
        &self,
        cancelled: Booking,
        class: &Class,
        instructor_name: &str,
        class_name: &str,
    ) -> std::result::Result<Booking, StoreError> {
        let user_id = cancelled.user_id;
        match self
            .store
            .set_booking_status(cancelled.id, BookingStatus::Booked)
            .await?
        {
            Some(booking) => Ok(booking),
            // Row vanished since we read it; start over with a fresh one.
            None => {
                self.insert_booking(user_id, class, instructor_name, class_name.to_string())
                    .await
            }
        }
    }

    async fn insert_booking(
        &self,
        user_id: UserId,
        class: &Class,
        instructor_name: &str,
        class_name: String,
    ) -> std::result::Result<Booking, StoreError> {
        let booking = Booking {
            id: BookingId::new(),
            user_id,
            class_id: class.id,
            class_name,
            instructor: instructor_name.to_string(),
            date: class.date,
            time: class.time.clone(),
            place: class.place.clone(),
            status: BookingStatus::Booked,
            created_at: self.clock.now(),
        };
        self.store.insert_booking(booking.clone()).await?;
        Ok(booking)
    }

    /// Undo the participant add after the booking write failed.
    async fn release_seat(&self, class_id: ClassId, user_id: UserId) {
        match self.store.remove_participant(class_id, user_id).await {
            Ok(_) => {
                tracing::warn!(%user_id, %class_id, "Booking write failed; seat released");
            }
            Err(e) => {
                tracing::error!(%user_id, %class_id, error = %e, "Booking write failed and seat could not be released");
            }
        }
    }

    /// Cancel one of the user's active bookings and free the seat.
    ///
    /// No notification is sent.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`]: the user has no active booking matching `target`
    /// - [`BookingError::Internal`]: storage failure
    #[tracing::instrument(skip_all, fields(user_id = %user_id, target = ?target, mode = mode.as_str()))]
    pub async fn cancel_booking(
        &self,
        user_id: UserId,
        target: CancelTarget,
        mode: CancelMode,
    ) -> Result<CancelOutcome> {
        let found = self
            .find_active(user_id, target)
            .await?
            .ok_or_else(|| not_found(BOOKING_NOT_FOUND))?;

        let _guard = self.locks.lock(found.class_id).await;

        // A concurrent cancel may have won while we waited for the lock.
        let booking = self
            .store
            .get_booking(found.id)
            .await?
            .filter(|b| b.user_id == user_id && b.is_active())
            .ok_or_else(|| not_found(BOOKING_NOT_FOUND))?;

        self.store
            .remove_participant(booking.class_id, user_id)
            .await?;

        let cancelled = Booking {
            status: BookingStatus::Cancelled,
            ..booking.clone()
        };

        let written = match mode {
            CancelMode::Delete => self.store.delete_booking(booking.id).await.map(|_| cancelled),
            CancelMode::MarkCancelled => self
                .store
                .set_booking_status(booking.id, BookingStatus::Cancelled)
                .await
                .map(|updated| updated.unwrap_or(cancelled)),
        };

        match written {
            Ok(booking) => {
                tracing::info!(booking_id = %booking.id, class_id = %booking.class_id, "Booking cancelled");
                metrics::record_cancellation(mode.as_str());
                Ok(CancelOutcome { booking, mode })
            }
            Err(e) => {
                tracing::error!(booking_id = %booking.id, error = %e, "Cancellation write failed; restoring seat");
                self.restore_seat(&booking).await;
                Err(e.into())
            }
        }
    }

    /// Give the seat back to a booking whose cancel or delete did not land.
    async fn restore_seat(&self, booking: &Booking) {
        if let Err(e) = self
            .store
            .add_participant(booking.class_id, booking.user_id)
            .await
        {
            tracing::error!(booking_id = %booking.id, error = %e, "Seat could not be restored");
        }
    }

    async fn find_active(&self, user_id: UserId, target: CancelTarget) -> Result<Option<Booking>> {
        let booking = match target {
            CancelTarget::Booking(id) => self.store.get_booking(id).await?,
            CancelTarget::Class(class_id) => self.store.find_booking(user_id, class_id).await?,
        };
        Ok(booking.filter(|b| b.user_id == user_id && b.is_active()))
    }

    /// Delete one of the user's booking rows, whatever its status.
    ///
    /// The user's participant entry in the class is removed as well.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`]: no such booking for this user
    /// - [`BookingError::Internal`]: storage failure
    #[tracing::instrument(skip_all, fields(user_id = %user_id, booking_id = %booking_id))]
    pub async fn delete_booking(&self, user_id: UserId, booking_id: BookingId) -> Result<Booking> {
        let found = self
            .store
            .get_booking(booking_id)
            .await?
            .filter(|b| b.user_id == user_id)
            .ok_or_else(|| not_found(BOOKING_NOT_FOUND))?;

        let _guard = self.locks.lock(found.class_id).await;

        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .filter(|b| b.user_id == user_id)
            .ok_or_else(|| not_found(BOOKING_NOT_FOUND))?;

        self.store
            .remove_participant(booking.class_id, user_id)
            .await?;
        if let Err(e) = self.store.delete_booking(booking.id).await {
            tracing::error!(booking_id = %booking.id, error = %e, "Booking delete failed");
            if booking.is_active() {
                self.restore_seat(&booking).await;
            }
            return Err(e.into());
        }

        tracing::info!(class_id = %booking.class_id, status = booking.status.as_str(), "Booking deleted");
        metrics::record_cancellation(CancelMode::Delete.as_str());

        Ok(booking)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notifications::BOOKING_CONFIRMED_TITLE;
    use fitbook_core::User;
    use fitbook_testing::{InMemoryEntityStore, fixtures, test_clock};

    struct Harness {
        store: Arc<InMemoryEntityStore>,
        engine: BookingEngine,
        instructor: User,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(InMemoryEntityStore::new());
            let clock: Arc<dyn Clock> = Arc::new(test_clock());
            let notifier = Notifier::new(store.clone(), clock.clone());
            let engine = BookingEngine::new(store.clone(), notifier, ClassLocks::new(), clock);
            Self {
                store,
                engine,
                instructor: fixtures::instructor("Ivy"),
            }
        }

        async fn class(&self, capacity: u32) -> Class {
            // A second call reports a duplicate instructor; ignore it.
            let _ = self.store.insert_user(self.instructor.clone()).await;
            let class = fixtures::class_by(&self.instructor, capacity);
            self.store.insert_class(class.clone()).await.unwrap();
            class
        }

        async fn reload(&self, class: &Class) -> Class {
            self.store.get_class(class.id).await.unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn test_book_class_seats_user_and_notifies() {
        let h = Harness::new();
        let class = h.class(3).await;
        let member = fixtures::member("Mo");

        let booking = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap();

        assert!(booking.is_active());
        assert_eq!(booking.class_name, "Yoga");
        assert_eq!(booking.instructor, h.instructor.name);
        assert_eq!(h.reload(&class).await.participants, vec![member.id]);

        let inbox = h.store.list_notifications(member.id).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].title, BOOKING_CONFIRMED_TITLE);
    }

    #[tokio::test]
    async fn test_blank_field_is_invalid() {
        let h = Harness::new();
        let class = h.class(3).await;
        let mut request = BookClassRequest::for_class(&class);
        request.place = "   ".to_string();

        let err = h
            .engine
            .book_class(fixtures::member("Mo").id, request)
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::Invalid(FIELDS_REQUIRED.to_string()));
    }

    #[tokio::test]
    async fn test_missing_instructor_is_invalid() {
        let h = Harness::new();
        let class = fixtures::class_by(&h.instructor, 3);
        h.store.insert_class(class.clone()).await.unwrap();

        let err = h
            .engine
            .book_class(fixtures::member("Mo").id, BookClassRequest::for_class(&class))
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::Invalid(INSTRUCTOR_MISSING.to_string()));
    }

    #[tokio::test]
    async fn test_orphan_participant_is_repaired_then_booked() {
        let h = Harness::new();
        let class = h.class(1).await;
        let member = fixtures::member("Mo");
        h.store.force_participant(class.id, member.id);

        let booking = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap();

        assert!(booking.is_active());
        assert_eq!(h.reload(&class).await.participants, vec![member.id]);
    }

    #[tokio::test]
    async fn test_unseated_active_booking_is_relinked() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        h.store
            .insert_booking(fixtures::booking_for(&member, &class))
            .await
            .unwrap();

        let err = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::Conflict(ALREADY_BOOKED.to_string()));
        assert_eq!(h.reload(&class).await.participants, vec![member.id]);
    }

    #[tokio::test]
    async fn test_failed_booking_write_releases_seat() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        h.store.fail_next_booking_write();

        let err = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Internal(_)));
        assert!(h.reload(&class).await.participants.is_empty());
        assert_eq!(h.store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_by_class_keeps_row_and_rebook_flips_it() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        let first = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap();

        let outcome = h
            .engine
            .cancel_booking(member.id, CancelTarget::Class(class.id), CancelMode::MarkCancelled)
            .await
            .unwrap();
        assert_eq!(outcome.booking.status, BookingStatus::Cancelled);
        assert!(h.reload(&class).await.participants.is_empty());
        assert_eq!(h.store.booking_count(), 1);

        let second = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert!(second.is_active());
        assert_eq!(h.store.booking_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_by_booking_id_deletes_row() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        let booking = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap();

        let outcome = h
            .engine
            .cancel_booking(member.id, CancelTarget::Booking(booking.id), CancelMode::Delete)
            .await
            .unwrap();

        assert_eq!(outcome.mode, CancelMode::Delete);
        assert_eq!(h.store.booking_count(), 0);
        assert!(h.reload(&class).await.participants.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_someone_elses_booking_is_not_found() {
        let h = Harness::new();
        let class = h.class(2).await;
        let owner = fixtures::member("Owner");
        let booking = h
            .engine
            .book_class(owner.id, BookClassRequest::for_class(&class))
            .await
            .unwrap();

        let err = h
            .engine
            .cancel_booking(
                fixtures::member("Other").id,
                CancelTarget::Booking(booking.id),
                CancelMode::Delete,
            )
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::NotFound(BOOKING_NOT_FOUND.to_string()));
        assert_eq!(h.reload(&class).await.participants, vec![owner.id]);
    }

    #[tokio::test]
    async fn test_delete_cancelled_booking_row() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        let booking = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap();
        h.engine
            .cancel_booking(member.id, CancelTarget::Class(class.id), CancelMode::MarkCancelled)
            .await
            .unwrap();

        let deleted = h.engine.delete_booking(member.id, booking.id).await.unwrap();

        assert_eq!(deleted.status, BookingStatus::Cancelled);
        assert_eq!(h.store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_active_booking_seated() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        let booking = h
            .engine
            .book_class(member.id, BookClassRequest::for_class(&class))
            .await
            .unwrap();
        h.store.fail_next_booking_delete();

        let err = h.engine.delete_booking(member.id, booking.id).await.unwrap_err();

        assert!(matches!(err, BookingError::Internal(_)));
        assert_eq!(h.reload(&class).await.participants, vec![member.id]);
        assert!(h.store.get_booking(booking.id).await.unwrap().unwrap().is_active());
    }

    #[tokio::test]
    async fn test_failed_delete_of_cancelled_row_takes_no_seat() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        let booking = Booking {
            status: BookingStatus::Cancelled,
            ..fixtures::booking_for(&member, &class)
        };
        h.store.insert_booking(booking.clone()).await.unwrap();
        h.store.fail_next_booking_delete();

        assert!(h.engine.delete_booking(member.id, booking.id).await.is_err());
        assert!(h.reload(&class).await.participants.is_empty());
        assert_eq!(h.store.booking_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_write_leaves_seat_to_active_winner() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        // Another process seated the member and wrote its row first.
        h.store.force_participant(class.id, member.id);
        h.store
            .insert_booking(fixtures::booking_for(&member, &class))
            .await
            .unwrap();

        let err = h
            .engine
            .settle_failed_write(class.id, member.id, StoreError::UniqueViolation("bookings".into()))
            .await;

        assert_eq!(err, BookingError::Conflict(ALREADY_BOOKED.to_string()));
        assert_eq!(h.reload(&class).await.participants, vec![member.id]);
    }

    #[tokio::test]
    async fn test_duplicate_write_against_cancelled_row_releases_seat() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        h.store.force_participant(class.id, member.id);
        h.store
            .insert_booking(Booking {
                status: BookingStatus::Cancelled,
                ..fixtures::booking_for(&member, &class)
            })
            .await
            .unwrap();

        let err = h
            .engine
            .settle_failed_write(class.id, member.id, StoreError::UniqueViolation("bookings".into()))
            .await;

        assert_eq!(err, BookingError::Conflict(ALREADY_BOOKED.to_string()));
        assert!(h.reload(&class).await.participants.is_empty());
    }

    #[tokio::test]
    async fn test_stale_read_does_not_evict_a_fresh_booking() {
        let h = Harness::new();
        let class = h.class(2).await;
        let member = fixtures::member("Mo");
        h.store.force_participant(class.id, member.id);
        h.store
            .insert_booking(fixtures::booking_for(&member, &class))
            .await
            .unwrap();
        let mut seen = h.reload(&class).await;

        // The booking row was read before the other writer inserted it.
        let err = h.engine.reconcile(member.id, &mut seen, None).await.unwrap_err();

        assert_eq!(err, BookingError::Conflict(ALREADY_BOOKED.to_string()));
        assert_eq!(h.reload(&class).await.participants, vec![member.id]);
    }
}
