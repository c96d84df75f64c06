//! Test data builders.
//!
//! Timestamps come from [`test_clock`](crate::test_clock) unless stated
//! otherwise so assertions on ordering stay deterministic.

use crate::test_clock;
use chrono::{Duration, NaiveDate};
use fitbook_core::environment::Clock;
use fitbook_core::types::{
    Booking, BookingId, BookingStatus, Category, Class, ClassId, Notification, NotificationId,
    NotificationKind, Role, User, UserId,
};

fn user(name: &str, role: Role) -> User {
    User {
        id: UserId::new(),
        name: name.to_string(),
        email: format!("{}-{}@example.com", name.to_lowercase(), UserId::new()),
        role,
    }
}

/// A member with a unique email.
#[must_use]
pub fn member(name: &str) -> User {
    user(name, Role::Member)
}

/// An instructor with a unique email.
#[must_use]
pub fn instructor(name: &str) -> User {
    user(name, Role::Instructor)
}

/// Date used by [`class_by`]: 2025-02-01.
#[must_use]
pub fn class_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 1).unwrap_or_default()
}

/// A Yoga class at 09:00 in "Studio A" with no participants.
#[must_use]
pub fn class_by(instructor: &User, max_participants: u32) -> Class {
    let now = test_clock().now();
    Class {
        id: ClassId::new(),
        instructor: instructor.id,
        instructor_name: instructor.name.clone(),
        category: Category::Yoga,
        exercise_type: "Vinyasa".to_string(),
        date: class_date(),
        time: "09:00".to_string(),
        place: "Studio A".to_string(),
        participants: Vec::new(),
        max_participants,
        created_at: now,
        updated_at: now,
    }
}

/// An active booking row snapshotting `class`.
#[must_use]
pub fn booking_for(member: &User, class: &Class) -> Booking {
    Booking {
        id: BookingId::new(),
        user_id: member.id,
        class_id: class.id,
        class_name: class.category.to_string(),
        instructor: class.instructor_name.clone(),
        date: class.date,
        time: class.time.clone(),
        place: class.place.clone(),
        status: BookingStatus::Booked,
        created_at: test_clock().now(),
    }
}

/// An unread system notification created `minutes_ago` before the test clock.
#[must_use]
pub fn notification_at(recipient: &User, minutes_ago: i64) -> Notification {
    Notification {
        id: NotificationId::new(),
        user_id: recipient.id,
        title: "Welcome".to_string(),
        message: "Welcome to Fitbook".to_string(),
        kind: NotificationKind::System,
        read: false,
        class_id: None,
        created_at: test_clock().now() - Duration::minutes(minutes_ago),
    }
}

/// An unread system notification stamped with the test clock.
#[must_use]
pub fn notification_for(recipient: &User) -> Notification {
    notification_at(recipient, 0)
}
