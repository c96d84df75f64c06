//! In-memory entity store for fast, deterministic tests.
//!
//! Provides [`InMemoryEntityStore`], a `HashMap`-backed implementation of
//! [`EntityStore`] that honours the same guarantees as the Postgres store:
//! unique `(user, class)` bookings and an atomic conditional participant add.
//!
//! Failure injection hooks let tests exercise compensation and best-effort
//! paths without a real database.

use chrono::{DateTime, Utc};
use fitbook_core::store::{
    BookingFilter, ClassFilter, EntityStore, ParticipantAdd, StoreError, StoreFuture,
};
use fitbook_core::types::{
    Booking, BookingId, BookingStatus, Class, ClassChanges, ClassId, Notification,
    NotificationId, Role, User, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    classes: HashMap<ClassId, Class>,
    bookings: HashMap<BookingId, Booking>,
    notifications: HashMap<NotificationId, Notification>,
}

/// In-memory [`EntityStore`].
///
/// Cloning shares the underlying tables.
///
/// # Example
///
/// ```
/// use fitbook_testing::InMemoryEntityStore;
/// use fitbook_testing::fixtures;
/// use fitbook_core::EntityStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryEntityStore::new();
/// let member = fixtures::member("Grace");
/// store.insert_user(member.clone()).await?;
/// assert_eq!(store.get_user(member.id).await?, Some(member));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEntityStore {
    tables: Arc<Mutex<Tables>>,
    fail_next_booking_write: Arc<AtomicBool>,
    fail_next_booking_delete: Arc<AtomicBool>,
    fail_notifications: Arc<AtomicBool>,
}

impl InMemoryEntityStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next booking insert or status change fail with a database error.
    pub fn fail_next_booking_write(&self) {
        self.fail_next_booking_write.store(true, Ordering::SeqCst);
    }

    /// Make the next single-booking delete fail with a database error.
    pub fn fail_next_booking_delete(&self) {
        self.fail_next_booking_delete.store(true, Ordering::SeqCst);
    }

    /// Make every notification insert fail until turned off again.
    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Put `user` into a class's participant list without touching bookings.
    ///
    /// Used to set up participant/booking discrepancies.
    pub fn force_participant(&self, class: ClassId, user: UserId) {
        if let Some(class) = self.tables().classes.get_mut(&class) {
            if !class.participants.contains(&user) {
                class.participants.push(user);
            }
        }
    }

    /// Number of booking rows, any status.
    #[must_use]
    pub fn booking_count(&self) -> usize {
        self.tables().bookings.len()
    }

    /// Number of classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.tables().classes.len()
    }

    /// Every booking row, unordered.
    #[must_use]
    pub fn all_bookings(&self) -> Vec<Booking> {
        self.tables().bookings.values().cloned().collect()
    }

    fn take_booking_failure(&self) -> Result<(), StoreError> {
        if self.fail_next_booking_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Database("injected booking write failure".to_string()));
        }
        Ok(())
    }
}

impl EntityStore for InMemoryEntityStore {
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn insert_user(&self, user: User) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tables = self.tables();
            if tables.users.contains_key(&user.id)
                || tables.users.values().any(|u| u.email == user.email)
            {
                return Err(StoreError::UniqueViolation(format!(
                    "user {} already exists",
                    user.email
                )));
            }
            tables.users.insert(user.id, user);
            Ok(())
        })
    }

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move { Ok(self.tables().users.get(&id).cloned()) })
    }

    fn set_user_role(&self, id: UserId, role: Role) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            Ok(self.tables().users.get_mut(&id).map(|user| {
                user.role = role;
                user.clone()
            }))
        })
    }

    fn insert_class(&self, class: Class) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tables = self.tables();
            if tables.classes.contains_key(&class.id) {
                return Err(StoreError::UniqueViolation(format!(
                    "class {} already exists",
                    class.id
                )));
            }
            tables.classes.insert(class.id, class);
            Ok(())
        })
    }

    fn get_class(&self, id: ClassId) -> StoreFuture<'_, Option<Class>> {
        Box::pin(async move { Ok(self.tables().classes.get(&id).cloned()) })
    }

    fn update_class(
        &self,
        id: ClassId,
        changes: ClassChanges,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Class>> {
        Box::pin(async move {
            Ok(self.tables().classes.get_mut(&id).map(|class| {
                changes.apply_to(class);
                class.updated_at = updated_at;
                class.clone()
            }))
        })
    }

    fn delete_class(&self, id: ClassId) -> StoreFuture<'_, bool> {
        Box::pin(async move { Ok(self.tables().classes.remove(&id).is_some()) })
    }

    fn list_classes(&self, filter: ClassFilter) -> StoreFuture<'_, Vec<Class>> {
        Box::pin(async move {
            let mut classes: Vec<Class> = self
                .tables()
                .classes
                .values()
                .filter(|class| filter.matches(class))
                .cloned()
                .collect();
            classes.sort_by(|a, b| a.schedule_key().cmp(&b.schedule_key()));
            Ok(classes)
        })
    }

    fn add_participant(&self, class: ClassId, user: UserId) -> StoreFuture<'_, ParticipantAdd> {
        Box::pin(async move {
            let mut tables = self.tables();
            let Some(class) = tables.classes.get_mut(&class) else {
                return Ok(ParticipantAdd::ClassMissing);
            };
            if class.has_participant(user) {
                return Ok(ParticipantAdd::AlreadyPresent);
            }
            if class.is_full() {
                return Ok(ParticipantAdd::Full);
            }
            class.participants.push(user);
            Ok(ParticipantAdd::Added(class.clone()))
        })
    }

    fn remove_participant(&self, class: ClassId, user: UserId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let mut tables = self.tables();
            let Some(class) = tables.classes.get_mut(&class) else {
                return Ok(false);
            };
            let before = class.participants.len();
            class.participants.retain(|id| *id != user);
            Ok(class.participants.len() != before)
        })
    }

    fn insert_booking(&self, booking: Booking) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.take_booking_failure()?;
            let mut tables = self.tables();
            if tables
                .bookings
                .values()
                .any(|b| b.user_id == booking.user_id && b.class_id == booking.class_id)
            {
                return Err(StoreError::UniqueViolation(format!(
                    "booking for user {} and class {} already exists",
                    booking.user_id, booking.class_id
                )));
            }
            tables.bookings.insert(booking.id, booking);
            Ok(())
        })
    }

    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move { Ok(self.tables().bookings.get(&id).cloned()) })
    }

    fn find_booking(&self, user: UserId, class: ClassId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            Ok(self
                .tables()
                .bookings
                .values()
                .find(|b| b.user_id == user && b.class_id == class)
                .cloned())
        })
    }

    fn set_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            self.take_booking_failure()?;
            Ok(self.tables().bookings.get_mut(&id).map(|booking| {
                booking.status = status;
                booking.clone()
            }))
        })
    }

    fn delete_booking(&self, id: BookingId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            if self.fail_next_booking_delete.swap(false, Ordering::SeqCst) {
                return Err(StoreError::Database("injected booking delete failure".to_string()));
            }
            Ok(self.tables().bookings.remove(&id).is_some())
        })
    }

    fn delete_bookings_for_class(&self, class: ClassId) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let mut tables = self.tables();
            let before = tables.bookings.len();
            tables.bookings.retain(|_, b| b.class_id != class);
            Ok((before - tables.bookings.len()) as u64)
        })
    }

    fn list_bookings(&self, filter: BookingFilter) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let mut bookings: Vec<Booking> = self
                .tables()
                .bookings
                .values()
                .filter(|b| filter.matches(b))
                .cloned()
                .collect();
            bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(bookings)
        })
    }

    fn insert_notification(&self, notification: Notification) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if self.fail_notifications.load(Ordering::SeqCst) {
                return Err(StoreError::Database(
                    "injected notification failure".to_string(),
                ));
            }
            self.tables()
                .notifications
                .insert(notification.id, notification);
            Ok(())
        })
    }

    fn list_notifications(&self, user: UserId) -> StoreFuture<'_, Vec<Notification>> {
        Box::pin(async move {
            let mut notifications: Vec<Notification> = self
                .tables()
                .notifications
                .values()
                .filter(|n| n.user_id == user)
                .cloned()
                .collect();
            notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(notifications)
        })
    }

    fn mark_notification_read(&self, id: NotificationId, user: UserId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            match self.tables().notifications.get_mut(&id) {
                Some(notification) if notification.user_id == user => {
                    notification.read = true;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn mark_all_notifications_read(&self, user: UserId) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let mut changed = 0;
            for notification in self.tables().notifications.values_mut() {
                if notification.user_id == user && !notification.read {
                    notification.read = true;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }
}
