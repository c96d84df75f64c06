//! Domain types for the Fitbook booking service.
//!
//! This module contains identifiers, entities, and value objects shared by the
//! booking engine, the class lifecycle manager and the storage backends.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default seat ceiling for a class when the instructor does not pick one.
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 20;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a user (member or instructor)
    UserId
);
entity_id!(
    /// Unique identifier for a scheduled class
    ClassId
);
entity_id!(
    /// Unique identifier for a booking row
    BookingId
);
entity_id!(
    /// Unique identifier for a notification
    NotificationId
);

// ============================================================================
// Users
// ============================================================================

/// Role of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Books seats in classes
    Member,
    /// Creates and manages classes
    Instructor,
}

impl Role {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Instructor => "instructor",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "instructor" => Ok(Self::Instructor),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Role
    pub role: Role,
}

impl User {
    /// Whether this user may author classes.
    #[must_use]
    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Class category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Cardio
    Cardio,
    /// Flexibility
    Flexibility,
    /// Strength Training
    #[serde(rename = "Strength Training")]
    StrengthTraining,
    /// Yoga
    Yoga,
    /// Meditation
    Meditation,
}

impl Category {
    /// Display and storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cardio => "Cardio",
            Self::Flexibility => "Flexibility",
            Self::StrengthTraining => "Strength Training",
            Self::Yoga => "Yoga",
            Self::Meditation => "Meditation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cardio" => Ok(Self::Cardio),
            "Flexibility" => Ok(Self::Flexibility),
            "Strength Training" => Ok(Self::StrengthTraining),
            "Yoga" => Ok(Self::Yoga),
            "Meditation" => Ok(Self::Meditation),
            other => Err(UnknownVariant::new("category", other)),
        }
    }
}

/// An instructor-authored class session.
///
/// `participants` has set semantics and never grows past `max_participants`;
/// both are guaranteed by the store's conditional add, not by this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    /// Class ID
    pub id: ClassId,
    /// Owning instructor
    pub instructor: UserId,
    /// Instructor display name at creation time (never re-synced)
    pub instructor_name: String,
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
    /// Users holding a seat
    pub participants: Vec<UserId>,
    /// Capacity ceiling
    pub max_participants: u32,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Class {
    /// Whether `user_id` currently holds a seat.
    #[must_use]
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants.contains(&user_id)
    }

    /// Whether every seat is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants as usize
    }

    /// Seats still open.
    #[must_use]
    pub fn available_seats(&self) -> u32 {
        let taken = u32::try_from(self.participants.len()).unwrap_or(u32::MAX);
        self.max_participants.saturating_sub(taken)
    }

    /// Ordering key used by every class listing: date, then time.
    #[must_use]
    pub fn schedule_key(&self) -> (NaiveDate, &str) {
        (self.date, self.time.as_str())
    }
}

/// Descriptive fields an instructor may edit after creation.
///
/// `None` leaves the field as it is. Capacity and participants are not editable here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassChanges {
    /// New category
    pub category: Option<Category>,
    /// New exercise type
    pub exercise_type: Option<String>,
    /// New date
    pub date: Option<NaiveDate>,
    /// New start time
    pub time: Option<String>,
    /// New place
    pub place: Option<String>,
}

impl ClassChanges {
    /// Apply the changes to `class` in place.
    pub fn apply_to(&self, class: &mut Class) {
        if let Some(category) = self.category {
            class.category = category;
        }
        if let Some(exercise_type) = &self.exercise_type {
            class.exercise_type.clone_from(exercise_type);
        }
        if let Some(date) = self.date {
            class.date = date;
        }
        if let Some(time) = &self.time {
            class.time.clone_from(time);
        }
        if let Some(place) = &self.place {
            class.place.clone_from(place);
        }
    }

    /// True when nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.exercise_type.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.place.is_none()
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// Status of a booking row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Seat held
    Booked,
    /// Seat released, row kept for history
    Cancelled,
}

impl BookingStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(Self::Booked),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("booking status", other)),
        }
    }
}

/// A member's reservation for one class.
///
/// `class_name`, `instructor`, `date`, `time` and `place` are a snapshot taken
/// when the row was first created and are not updated by later class edits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Member holding the booking
    pub user_id: UserId,
    /// Booked class
    pub class_id: ClassId,
    /// Class name snapshot
    pub class_name: String,
    /// Instructor name snapshot
    pub instructor: String,
    /// Date snapshot
    pub date: NaiveDate,
    /// Time snapshot
    pub time: String,
    /// Place snapshot
    pub place: String,
    /// Current status
    pub status: BookingStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Whether this booking currently holds a seat.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Booked
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Kind of notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Emitted by a successful booking
    Booking,
    /// Generic system message
    System,
    /// Upcoming class reminder
    Reminder,
}

impl NotificationKind {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::System => "system",
            Self::Reminder => "reminder",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booking" => Ok(Self::Booking),
            "system" => Ok(Self::System),
            "reminder" => Ok(Self::Reminder),
            other => Err(UnknownVariant::new("notification type", other)),
        }
    }
}

/// Informational message addressed to one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID
    pub id: NotificationId,
    /// Recipient
    pub user_id: UserId,
    /// Title
    pub title: String,
    /// Body
    pub message: String,
    /// Kind
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Read flag
    pub read: bool,
    /// Related class, if any
    pub class_id: Option<ClassId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Parsing errors
// ============================================================================

/// A stored or submitted enum value that does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
