//! Read side: listings for members and instructors.
//!
//! Nothing here writes. Instructor names are resolved from the live user
//! record where possible so a renamed instructor shows up under the new name;
//! the denormalized name on the class or booking is the fallback.

use fitbook_core::error::Result;
use fitbook_core::{
    Booking, BookingFilter, BookingId, BookingStatus, BookingError, Category, Class, ClassFilter,
    ClassId, DateTime, EntityStore, NaiveDate, User, UserId, Utc,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A member's active booking as listed on "my bookings".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    /// Booking ID
    pub id: BookingId,
    /// Booked class
    pub class_id: ClassId,
    /// Class name snapshot
    pub class_name: String,
    /// Live instructor name, or the snapshot when the class or instructor is gone
    pub instructor: String,
    /// Date snapshot
    pub date: NaiveDate,
    /// Time snapshot
    pub time: String,
    /// Place snapshot
    pub place: String,
    /// Always `booked`
    pub status: BookingStatus,
}

/// Response of `GET /api/bookings/my-bookings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyBookings {
    /// Active bookings, newest first
    pub bookings: Vec<BookingView>,
    /// Every class the member is booked into, from either side of the pairing
    pub booked_class_ids: Vec<ClassId>,
}

/// Instructor reference embedded in a [`ClassView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructorView {
    /// Instructor user ID
    pub id: UserId,
    /// Display name
    pub name: String,
}

/// A class as shown in the public catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassView {
    /// Class ID
    pub id: ClassId,
    /// Owning instructor
    pub instructor: InstructorView,
    /// Category
    pub category: Category,
    /// Exercise type
    pub exercise_type: String,
    /// Day of the session
    pub date: NaiveDate,
    /// Start time
    pub time: String,
    /// Location
    pub place: String,
    /// Users holding a seat
    pub participants: Vec<UserId>,
    /// Capacity
    pub max_participants: u32,
    /// Seats still open
    pub available_seats: u32,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Read-only queries over the entity store.
#[derive(Clone)]
pub struct Queries {
    store: Arc<dyn EntityStore>,
}

impl Queries {
    /// Create the query layer.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// The member's active bookings plus the ids of every class they are in.
    ///
    /// `booked_class_ids` is the de-duplicated union of the bookings' classes
    /// and the classes listing the member as a participant.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Internal`] if the store fails.
    pub async fn list_my_bookings(&self, user_id: UserId) -> Result<MyBookings> {
        let bookings = self
            .store
            .list_bookings(BookingFilter {
                user: Some(user_id),
                status: Some(BookingStatus::Booked),
                ..BookingFilter::default()
            })
            .await?;

        let seated = self
            .store
            .list_classes(ClassFilter {
                participant: Some(user_id),
                ..ClassFilter::default()
            })
            .await?;

        let mut names = NameCache::new(self.store.as_ref());
        let mut views = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let instructor = names.for_booking(&booking).await?;
            views.push(BookingView {
                id: booking.id,
                class_id: booking.class_id,
                class_name: booking.class_name,
                instructor,
                date: booking.date,
                time: booking.time,
                place: booking.place,
                status: booking.status,
            });
        }

        let mut seen = HashSet::new();
        let booked_class_ids = views
            .iter()
            .map(|view| view.class_id)
            .chain(seated.iter().map(|class| class.id))
            .filter(|id| seen.insert(*id))
            .collect();

        Ok(MyBookings {
            bookings: views,
            booked_class_ids,
        })
    }

    /// Classes created by `actor`, ordered by date then time.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Forbidden`] for members.
    pub async fn list_instructor_classes(&self, actor: &User) -> Result<Vec<Class>> {
        if !actor.is_instructor() {
            return Err(BookingError::Forbidden(
                "Only instructors can view their classes".to_string(),
            ));
        }

        Ok(self
            .store
            .list_classes(ClassFilter {
                instructor: Some(actor.id),
                ..ClassFilter::default()
            })
            .await?)
    }

    /// Every class, ordered by date then time, with live instructor names.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Internal`] if the store fails.
    pub async fn list_all_classes(&self) -> Result<Vec<ClassView>> {
        let classes = self.store.list_classes(ClassFilter::default()).await?;
        self.class_views(classes).await
    }

    /// Classes the member holds a seat in, ordered by date then time.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Internal`] if the store fails.
    pub async fn list_my_classes(&self, user_id: UserId) -> Result<Vec<ClassView>> {
        let classes = self
            .store
            .list_classes(ClassFilter {
                participant: Some(user_id),
                ..ClassFilter::default()
            })
            .await?;
        self.class_views(classes).await
    }

    async fn class_views(&self, classes: Vec<Class>) -> Result<Vec<ClassView>> {
        let mut names = NameCache::new(self.store.as_ref());
        let mut views = Vec::with_capacity(classes.len());
        for class in classes {
            let name = names
                .user_name(class.instructor)
                .await?
                .unwrap_or_else(|| class.instructor_name.clone());
            views.push(ClassView {
                id: class.id,
                instructor: InstructorView {
                    id: class.instructor,
                    name,
                },
                available_seats: class.available_seats(),
                category: class.category,
                exercise_type: class.exercise_type,
                date: class.date,
                time: class.time,
                place: class.place,
                participants: class.participants,
                max_participants: class.max_participants,
                created_at: class.created_at,
                updated_at: class.updated_at,
            });
        }
        Ok(views)
    }
}

/// Per-query memo of user and class lookups.
struct NameCache<'a> {
    store: &'a dyn EntityStore,
    users: HashMap<UserId, Option<String>>,
    classes: HashMap<ClassId, Option<UserId>>,
}

impl<'a> NameCache<'a> {
    fn new(store: &'a dyn EntityStore) -> Self {
        Self {
            store,
            users: HashMap::new(),
            classes: HashMap::new(),
        }
    }

    async fn user_name(&mut self, id: UserId) -> Result<Option<String>> {
        if let Some(name) = self.users.get(&id) {
            return Ok(name.clone());
        }
        let name = self.store.get_user(id).await?.map(|user| user.name);
        self.users.insert(id, name.clone());
        Ok(name)
    }

    /// Live instructor of the booked class, falling back to the snapshot.
    async fn for_booking(&mut self, booking: &Booking) -> Result<String> {
        let instructor = match self.classes.get(&booking.class_id) {
            Some(instructor) => *instructor,
            None => {
                let instructor = self
                    .store
                    .get_class(booking.class_id)
                    .await?
                    .map(|class| class.instructor);
                self.classes.insert(booking.class_id, instructor);
                instructor
            }
        };

        let live = match instructor {
            Some(id) => self.user_name(id).await?,
            None => None,
        };
        Ok(live.unwrap_or_else(|| booking.instructor.clone()))
    }
}
