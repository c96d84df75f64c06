//! Class lifecycle: creation, edits and deletion by instructors.
//!
//! Edits only touch descriptive fields. Bookings keep the snapshot taken
//! when they were created, so renaming or moving a class does not rewrite
//! anyone's booking history. Deleting a class purges its bookings first,
//! under the class lock, so no booking outlives its class.

use crate::engine::CLASS_NOT_FOUND;
use crate::locks::ClassLocks;
use crate::metrics;
use chrono::{NaiveDate, NaiveTime};
use fitbook_core::environment::Clock;
use fitbook_core::error::Result;
use fitbook_core::{BookingError, Category, Class, ClassChanges, ClassId, EntityStore, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /api/classes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    /// Category
    pub category: Category,
    /// Free-text exercise type
    pub exercise_type: String,
    /// Day of the session
    pub date: NaiveDate,
    /// Start time, `HH:MM`
    pub time: String,
    /// Location
    pub place: String,
    /// Capacity; the configured default when absent
    #[serde(default)]
    pub max_participants: Option<u32>,
}

/// Instructor-only operation on classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassAction {
    /// `POST /api/classes`
    Create,
    /// `PUT /api/classes/:id`
    Update,
    /// `DELETE /api/classes/:id`
    Delete,
}

impl ClassAction {
    const fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Reject members before anything else about the request is looked at.
///
/// # Errors
///
/// [`BookingError::Forbidden`] when `actor` is not an instructor.
pub fn ensure_instructor(actor: &User, action: ClassAction) -> Result<()> {
    if actor.is_instructor() {
        Ok(())
    } else {
        Err(forbidden(&format!(
            "Only instructors can {} classes",
            action.verb()
        )))
    }
}

/// Creates, edits and deletes classes on behalf of instructors.
#[derive(Clone)]
pub struct ClassLifecycle {
    store: Arc<dyn EntityStore>,
    locks: ClassLocks,
    clock: Arc<dyn Clock>,
    default_max_participants: u32,
}

impl ClassLifecycle {
    /// Create a lifecycle manager sharing `locks` with the booking engine.
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        locks: ClassLocks,
        clock: Arc<dyn Clock>,
        default_max_participants: u32,
    ) -> Self {
        Self {
            store,
            locks,
            clock,
            default_max_participants,
        }
    }

    /// Create a class owned by `actor`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Forbidden`]: `actor` is not an instructor
    /// - [`BookingError::Invalid`]: blank exercise type, time or place, or zero capacity
    #[tracing::instrument(skip_all, fields(instructor = %actor.id, category = %new.category))]
    pub async fn create_class(&self, actor: &User, new: NewClass) -> Result<Class> {
        ensure_instructor(actor, ClassAction::Create)?;

        let max_participants = new
            .max_participants
            .unwrap_or(self.default_max_participants);
        if max_participants == 0 {
            return Err(BookingError::Invalid(
                "maxParticipants must be at least 1".to_string(),
            ));
        }

        let exercise_type = required("exerciseType", &new.exercise_type)?;
        let time = start_time(&new.time)?;
        let place = required("place", &new.place)?;

        let now = self.clock.now();
        let class = Class {
            id: ClassId::new(),
            instructor: actor.id,
            instructor_name: actor.name.clone(),
            category: new.category,
            exercise_type,
            date: new.date,
            time,
            place,
            participants: Vec::new(),
            max_participants,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_class(class.clone()).await?;

        tracing::info!(class_id = %class.id, max_participants, "Class created");
        metrics::record_class_operation("create");
        Ok(class)
    }

    /// Apply descriptive edits to one of `actor`'s classes.
    ///
    /// Existing bookings are not touched.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Forbidden`]: not an instructor, or not the owner
    /// - [`BookingError::NotFound`]: no such class
    /// - [`BookingError::Invalid`]: a provided text field is blank
    #[tracing::instrument(skip_all, fields(instructor = %actor.id, class_id = %class_id))]
    pub async fn update_class(
        &self,
        actor: &User,
        class_id: ClassId,
        mut changes: ClassChanges,
    ) -> Result<Class> {
        ensure_instructor(actor, ClassAction::Update)?;
        let class = self.owned_class(actor, class_id, ClassAction::Update).await?;

        changes.exercise_type = optional("exerciseType", changes.exercise_type)?;
        changes.time = changes.time.as_deref().map(start_time).transpose()?;
        changes.place = optional("place", changes.place)?;

        if changes.is_empty() {
            return Ok(class);
        }

        let updated = self
            .store
            .update_class(class_id, changes, self.clock.now())
            .await?
            .ok_or_else(|| BookingError::NotFound(CLASS_NOT_FOUND.to_string()))?;

        tracing::info!("Class updated");
        metrics::record_class_operation("update");
        Ok(updated)
    }

    /// Delete one of `actor`'s classes together with all its bookings.
    ///
    /// Returns the number of booking rows removed.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Forbidden`]: not an instructor, or not the owner
    /// - [`BookingError::NotFound`]: no such class
    #[tracing::instrument(skip_all, fields(instructor = %actor.id, class_id = %class_id))]
    pub async fn delete_class(&self, actor: &User, class_id: ClassId) -> Result<u64> {
        ensure_instructor(actor, ClassAction::Delete)?;
        self.owned_class(actor, class_id, ClassAction::Delete).await?;

        let _guard = self.locks.lock(class_id).await;

        let purged = self.store.delete_bookings_for_class(class_id).await?;
        if !self.store.delete_class(class_id).await? {
            return Err(BookingError::NotFound(CLASS_NOT_FOUND.to_string()));
        }

        tracing::info!(purged, "Class deleted");
        metrics::record_class_operation("delete");
        Ok(purged)
    }

    async fn owned_class(
        &self,
        actor: &User,
        class_id: ClassId,
        action: ClassAction,
    ) -> Result<Class> {
        let class = self
            .store
            .get_class(class_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(CLASS_NOT_FOUND.to_string()))?;

        if class.instructor != actor.id {
            return Err(forbidden(&format!(
                "You can only {} your own classes",
                action.verb()
            )));
        }
        Ok(class)
    }
}

fn forbidden(message: &str) -> BookingError {
    BookingError::Forbidden(message.to_string())
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::Invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// A start time in zero-padded 24-hour `HH:MM`, so that classes on the same
/// day order correctly by their time string.
fn start_time(value: &str) -> Result<String> {
    let time = required("time", value)?;
    if NaiveTime::parse_from_str(&time, "%H:%M").is_err() || time.len() != 5 {
        return Err(BookingError::Invalid(
            "time must be in HH:MM format".to_string(),
        ));
    }
    Ok(time)
}

fn optional(field: &str, value: Option<String>) -> Result<Option<String>> {
    value.map(|v| required(field, &v)).transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::{BookClassRequest, BookingEngine};
    use crate::notifications::Notifier;
    use fitbook_core::BookingFilter;
    use fitbook_testing::{InMemoryEntityStore, fixtures, test_clock};

    fn lifecycle(store: &Arc<InMemoryEntityStore>) -> ClassLifecycle {
        ClassLifecycle::new(store.clone(), ClassLocks::new(), Arc::new(test_clock()), 20)
    }

    fn new_class() -> NewClass {
        NewClass {
            category: Category::Cardio,
            exercise_type: "Spin".to_string(),
            date: fixtures::class_date(),
            time: "18:30".to_string(),
            place: "Room 2".to_string(),
            max_participants: None,
        }
    }

    #[tokio::test]
    async fn test_member_cannot_create_class() {
        let store = Arc::new(InMemoryEntityStore::new());
        let err = lifecycle(&store)
            .create_class(&fixtures::member("Mo"), new_class())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BookingError::Forbidden("Only instructors can create classes".to_string())
        );
        assert_eq!(store.class_count(), 0);
    }

    #[tokio::test]
    async fn test_create_uses_default_capacity() {
        let store = Arc::new(InMemoryEntityStore::new());
        let ivy = fixtures::instructor("Ivy");

        let class = lifecycle(&store).create_class(&ivy, new_class()).await.unwrap();

        assert_eq!(class.max_participants, 20);
        assert_eq!(class.instructor_name, "Ivy");
        assert!(class.participants.is_empty());
    }

    #[tokio::test]
    async fn test_zero_capacity_and_blank_place_are_invalid() {
        let store = Arc::new(InMemoryEntityStore::new());
        let ivy = fixtures::instructor("Ivy");
        let lifecycle = lifecycle(&store);

        let mut zero = new_class();
        zero.max_participants = Some(0);
        assert!(matches!(
            lifecycle.create_class(&ivy, zero).await,
            Err(BookingError::Invalid(_))
        ));

        let mut blank = new_class();
        blank.place = " ".to_string();
        assert!(matches!(
            lifecycle.create_class(&ivy, blank).await,
            Err(BookingError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_start_time_must_be_padded_hh_mm() {
        let store = Arc::new(InMemoryEntityStore::new());
        let ivy = fixtures::instructor("Ivy");
        let lifecycle = lifecycle(&store);

        for bad in ["9:00", "24:00", "18.30", "18:30:00", "evening"] {
            let mut class = new_class();
            class.time = bad.to_string();
            assert_eq!(
                lifecycle.create_class(&ivy, class).await.unwrap_err(),
                BookingError::Invalid("time must be in HH:MM format".to_string()),
                "accepted {bad}"
            );
        }

        let created = lifecycle.create_class(&ivy, new_class()).await.unwrap();
        let err = lifecycle
            .update_class(
                &ivy,
                created.id,
                ClassChanges {
                    time: Some("7:15".to_string()),
                    ..ClassChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));

        let mut padded = new_class();
        padded.time = " 07:15 ".to_string();
        assert_eq!(lifecycle.create_class(&ivy, padded).await.unwrap().time, "07:15");
    }

    #[test]
    fn test_ensure_instructor_names_the_action() {
        let member = fixtures::member("Mo");

        assert_eq!(
            ensure_instructor(&member, ClassAction::Update),
            Err(BookingError::Forbidden("Only instructors can update classes".to_string()))
        );
        assert_eq!(
            ensure_instructor(&member, ClassAction::Delete),
            Err(BookingError::Forbidden("Only instructors can delete classes".to_string()))
        );
        assert!(ensure_instructor(&fixtures::instructor("Ivy"), ClassAction::Create).is_ok());
    }

    #[tokio::test]
    async fn test_only_owner_may_update() {
        let store = Arc::new(InMemoryEntityStore::new());
        let owner = fixtures::instructor("Owner");
        let other = fixtures::instructor("Other");
        let lifecycle = lifecycle(&store);
        let class = lifecycle.create_class(&owner, new_class()).await.unwrap();

        let changes = ClassChanges {
            place: Some("Room 9".to_string()),
            ..ClassChanges::default()
        };
        let err = lifecycle
            .update_class(&other, class.id, changes.clone())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::Forbidden("You can only update your own classes".to_string())
        );

        let updated = lifecycle.update_class(&owner, class.id, changes).await.unwrap();
        assert_eq!(updated.place, "Room 9");
    }

    #[tokio::test]
    async fn test_update_unknown_class_is_not_found() {
        let store = Arc::new(InMemoryEntityStore::new());
        let err = lifecycle(&store)
            .update_class(&fixtures::instructor("Ivy"), ClassId::new(), ClassChanges::default())
            .await
            .unwrap_err();

        assert_eq!(err, BookingError::NotFound(CLASS_NOT_FOUND.to_string()));
    }

    #[tokio::test]
    async fn test_delete_purges_bookings() {
        let store = Arc::new(InMemoryEntityStore::new());
        let clock: Arc<dyn Clock> = Arc::new(test_clock());
        let locks = ClassLocks::new();
        let lifecycle = ClassLifecycle::new(store.clone(), locks.clone(), clock.clone(), 20);
        let engine = BookingEngine::new(
            store.clone(),
            Notifier::new(store.clone(), clock.clone()),
            locks,
            clock,
        );

        let ivy = fixtures::instructor("Ivy");
        store.insert_user(ivy.clone()).await.unwrap();
        let class = lifecycle.create_class(&ivy, new_class()).await.unwrap();
        for name in ["A", "B"] {
            engine
                .book_class(fixtures::member(name).id, BookClassRequest::for_class(&class))
                .await
                .unwrap();
        }

        let purged = lifecycle.delete_class(&ivy, class.id).await.unwrap();

        assert_eq!(purged, 2);
        assert_eq!(store.class_count(), 0);
        assert!(
            store
                .list_bookings(BookingFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
