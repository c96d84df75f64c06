//! Row decoding and error mapping.

use fitbook_core::store::StoreError;
use fitbook_core::types::{
    Booking, BookingId, Class, ClassId, Notification, NotificationId, User, UserId,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = "id, name, email, role";

pub(crate) const CLASS_COLUMNS: &str = "id, instructor_id, instructor_name, category, \
     exercise_type, class_date, class_time, place, participants, max_participants, \
     created_at, updated_at";

pub(crate) const BOOKING_COLUMNS: &str = "id, user_id, class_id, class_name, instructor, \
     class_date, class_time, place, status, created_at";

pub(crate) const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, kind, is_read, class_id, created_at";

/// Map a sqlx error, surfacing unique violations as their own variant.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(format!("{context}: {db_err}"));
            }
        }
        StoreError::Database(format!("{context}: {e}"))
    }
}

fn decode(e: impl std::fmt::Display) -> StoreError {
    StoreError::Serialization(e.to_string())
}

pub(crate) fn capacity_to_db(max_participants: u32) -> Result<i32, StoreError> {
    i32::try_from(max_participants).map_err(decode)
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role").map_err(decode)?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        role: role.parse().map_err(decode)?,
    })
}

pub(crate) fn class_from_row(row: &PgRow) -> Result<Class, StoreError> {
    let category: String = row.try_get("category").map_err(decode)?;
    let participants: Vec<Uuid> = row.try_get("participants").map_err(decode)?;
    let max_participants: i32 = row.try_get("max_participants").map_err(decode)?;
    Ok(Class {
        id: ClassId::from_uuid(row.try_get("id").map_err(decode)?),
        instructor: UserId::from_uuid(row.try_get("instructor_id").map_err(decode)?),
        instructor_name: row.try_get("instructor_name").map_err(decode)?,
        category: category.parse().map_err(decode)?,
        exercise_type: row.try_get("exercise_type").map_err(decode)?,
        date: row.try_get("class_date").map_err(decode)?,
        time: row.try_get("class_time").map_err(decode)?,
        place: row.try_get("place").map_err(decode)?,
        participants: participants.into_iter().map(UserId::from_uuid).collect(),
        max_participants: u32::try_from(max_participants).map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

pub(crate) fn booking_from_row(row: &PgRow) -> Result<Booking, StoreError> {
    let status: String = row.try_get("status").map_err(decode)?;
    Ok(Booking {
        id: BookingId::from_uuid(row.try_get("id").map_err(decode)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(decode)?),
        class_id: ClassId::from_uuid(row.try_get("class_id").map_err(decode)?),
        class_name: row.try_get("class_name").map_err(decode)?,
        instructor: row.try_get("instructor").map_err(decode)?,
        date: row.try_get("class_date").map_err(decode)?,
        time: row.try_get("class_time").map_err(decode)?,
        place: row.try_get("place").map_err(decode)?,
        status: status.parse().map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

pub(crate) fn notification_from_row(row: &PgRow) -> Result<Notification, StoreError> {
    let kind: String = row.try_get("kind").map_err(decode)?;
    let class_id: Option<Uuid> = row.try_get("class_id").map_err(decode)?;
    Ok(Notification {
        id: NotificationId::from_uuid(row.try_get("id").map_err(decode)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(decode)?),
        title: row.try_get("title").map_err(decode)?,
        message: row.try_get("message").map_err(decode)?,
        kind: kind.parse().map_err(decode)?,
        read: row.try_get("is_read").map_err(decode)?,
        class_id: class_id.map(ClassId::from_uuid),
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}
