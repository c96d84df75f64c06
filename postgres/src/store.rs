//! `PostgreSQL` implementation of [`EntityStore`].

use crate::rows::{
    BOOKING_COLUMNS, CLASS_COLUMNS, NOTIFICATION_COLUMNS, USER_COLUMNS, booking_from_row,
    capacity_to_db, class_from_row, db_error, notification_from_row, user_from_row,
};
use chrono::{DateTime, Utc};
use fitbook_core::store::{
    BookingFilter, ClassFilter, EntityStore, ParticipantAdd, StoreError, StoreFuture,
};
use fitbook_core::types::{
    Booking, BookingId, BookingStatus, Class, ClassChanges, ClassId, Notification,
    NotificationId, Role, User, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;
use uuid::Uuid;

const ADD_PARTICIPANT_ATTEMPTS: usize = 3;

/// `PostgreSQL`-backed entity store.
///
/// Cheap to clone: the connection pool is reference counted.
#[derive(Clone, Debug)]
pub struct PostgresEntityStore {
    pool: PgPool,
}

impl PostgresEntityStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with a pool of at most `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Run the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Work out why a conditional participant add matched no row.
    ///
    /// Returns `None` when the class now has room and the user is absent, in
    /// which case the add should be attempted again.
    async fn explain_rejected_add(
        &self,
        class: ClassId,
        user: UserId,
    ) -> Result<Option<ParticipantAdd>, StoreError> {
        let row = sqlx::query(
            "SELECT $2 = ANY(participants) AS present, \
                    cardinality(participants) >= max_participants AS full \
             FROM classes WHERE id = $1",
        )
        .bind(class.as_uuid())
        .bind(user.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to inspect class"))?;

        let Some(row) = row else {
            return Ok(Some(ParticipantAdd::ClassMissing));
        };
        let present: bool = row
            .try_get("present")
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let full: bool = row
            .try_get("full")
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(if present {
            Some(ParticipantAdd::AlreadyPresent)
        } else if full {
            Some(ParticipantAdd::Full)
        } else {
            None
        })
    }
}

impl EntityStore for PostgresEntityStore {
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(db_error("Ping failed"))?;
            Ok(())
        })
    }

    fn insert_user(&self, user: User) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
                .bind(user.id.as_uuid())
                .bind(&user.name)
                .bind(&user.email)
                .bind(user.role.as_str())
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to insert user"))?;
            Ok(())
        })
    }

    fn get_user(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to get user"))?;
            row.as_ref().map(user_from_row).transpose()
        })
    }

    fn set_user_role(&self, id: UserId, role: Role) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            let sql = format!("UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
            let row = sqlx::query(&sql)
                .bind(id.as_uuid())
                .bind(role.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to update user role"))?;
            row.as_ref().map(user_from_row).transpose()
        })
    }

    fn insert_class(&self, class: Class) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let participants: Vec<Uuid> = class.participants.iter().map(|id| *id.as_uuid()).collect();
            sqlx::query(
                r"
                INSERT INTO classes (
                    id, instructor_id, instructor_name, category, exercise_type,
                    class_date, class_time, place, participants, max_participants,
                    created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ",
            )
            .bind(class.id.as_uuid())
            .bind(class.instructor.as_uuid())
            .bind(&class.instructor_name)
            .bind(class.category.as_str())
            .bind(&class.exercise_type)
            .bind(class.date)
            .bind(&class.time)
            .bind(&class.place)
            .bind(&participants)
            .bind(capacity_to_db(class.max_participants)?)
            .bind(class.created_at)
            .bind(class.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to insert class"))?;
            Ok(())
        })
    }

    fn get_class(&self, id: ClassId) -> StoreFuture<'_, Option<Class>> {
        Box::pin(async move {
            let sql = format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to get class"))?;
            row.as_ref().map(class_from_row).transpose()
        })
    }

    fn update_class(
        &self,
        id: ClassId,
        changes: ClassChanges,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Class>> {
        Box::pin(async move {
            let sql = format!(
                "UPDATE classes SET \
                     category = COALESCE($2, category), \
                     exercise_type = COALESCE($3, exercise_type), \
                     class_date = COALESCE($4, class_date), \
                     class_time = COALESCE($5, class_time), \
                     place = COALESCE($6, place), \
                     updated_at = $7 \
                 WHERE id = $1 RETURNING {CLASS_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(id.as_uuid())
                .bind(changes.category.map(|c| c.as_str()))
                .bind(changes.exercise_type.as_deref())
                .bind(changes.date)
                .bind(changes.time.as_deref())
                .bind(changes.place.as_deref())
                .bind(updated_at)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to update class"))?;
            row.as_ref().map(class_from_row).transpose()
        })
    }

    fn delete_class(&self, id: ClassId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM classes WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to delete class"))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn list_classes(&self, filter: ClassFilter) -> StoreFuture<'_, Vec<Class>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {CLASS_COLUMNS} FROM classes \
                 WHERE ($1::uuid IS NULL OR instructor_id = $1) \
                   AND ($2::uuid IS NULL OR $2 = ANY(participants)) \
                 ORDER BY class_date ASC, class_time ASC"
            );
            let rows = sqlx::query(&sql)
                .bind(filter.instructor.map(|id| *id.as_uuid()))
                .bind(filter.participant.map(|id| *id.as_uuid()))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list classes"))?;
            rows.iter().map(class_from_row).collect()
        })
    }

    fn add_participant(&self, class: ClassId, user: UserId) -> StoreFuture<'_, ParticipantAdd> {
        Box::pin(async move {
            let sql = format!(
                "UPDATE classes SET participants = array_append(participants, $2) \
                 WHERE id = $1 \
                   AND NOT ($2 = ANY(participants)) \
                   AND cardinality(participants) < max_participants \
                 RETURNING {CLASS_COLUMNS}"
            );
            for _ in 0..ADD_PARTICIPANT_ATTEMPTS {
                let row = sqlx::query(&sql)
                    .bind(class.as_uuid())
                    .bind(user.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error("Failed to add participant"))?;

                if let Some(row) = row {
                    return Ok(ParticipantAdd::Added(class_from_row(&row)?));
                }
                if let Some(outcome) = self.explain_rejected_add(class, user).await? {
                    return Ok(outcome);
                }
            }
            tracing::warn!(%class, %user, "Participant add kept racing with seat changes");
            Ok(ParticipantAdd::Full)
        })
    }

    fn remove_participant(&self, class: ClassId, user: UserId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE classes SET participants = array_remove(participants, $2) \
                 WHERE id = $1 AND $2 = ANY(participants)",
            )
            .bind(class.as_uuid())
            .bind(user.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to remove participant"))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn insert_booking(&self, booking: Booking) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO bookings (
                    id, user_id, class_id, class_name, instructor,
                    class_date, class_time, place, status, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ",
            )
            .bind(booking.id.as_uuid())
            .bind(booking.user_id.as_uuid())
            .bind(booking.class_id.as_uuid())
            .bind(&booking.class_name)
            .bind(&booking.instructor)
            .bind(booking.date)
            .bind(&booking.time)
            .bind(&booking.place)
            .bind(booking.status.as_str())
            .bind(booking.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to insert booking"))?;
            Ok(())
        })
    }

    fn get_booking(&self, id: BookingId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to get booking"))?;
            row.as_ref().map(booking_from_row).transpose()
        })
    }

    fn find_booking(&self, user: UserId, class: ClassId) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 AND class_id = $2"
            );
            let row = sqlx::query(&sql)
                .bind(user.as_uuid())
                .bind(class.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to find booking"))?;
            row.as_ref().map(booking_from_row).transpose()
        })
    }

    fn set_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let sql = format!(
                "UPDATE bookings SET status = $2 WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(id.as_uuid())
                .bind(status.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to update booking status"))?;
            row.as_ref().map(booking_from_row).transpose()
        })
    }

    fn delete_booking(&self, id: BookingId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to delete booking"))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn delete_bookings_for_class(&self, class: ClassId) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM bookings WHERE class_id = $1")
                .bind(class.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to delete class bookings"))?;
            Ok(result.rows_affected())
        })
    }

    fn list_bookings(&self, filter: BookingFilter) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings \
                 WHERE ($1::uuid IS NULL OR user_id = $1) \
                   AND ($2::uuid IS NULL OR class_id = $2) \
                   AND ($3::text IS NULL OR status = $3) \
                 ORDER BY created_at DESC"
            );
            let rows = sqlx::query(&sql)
                .bind(filter.user.map(|id| *id.as_uuid()))
                .bind(filter.class.map(|id| *id.as_uuid()))
                .bind(filter.status.map(|s| s.as_str()))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list bookings"))?;
            rows.iter().map(booking_from_row).collect()
        })
    }

    fn insert_notification(&self, notification: Notification) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO notifications (
                    id, user_id, title, message, kind, is_read, class_id, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(notification.id.as_uuid())
            .bind(notification.user_id.as_uuid())
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.kind.as_str())
            .bind(notification.read)
            .bind(notification.class_id.map(|id| *id.as_uuid()))
            .bind(notification.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to insert notification"))?;
            Ok(())
        })
    }

    fn list_notifications(&self, user: UserId) -> StoreFuture<'_, Vec<Notification>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
                 WHERE user_id = $1 ORDER BY created_at DESC"
            );
            let rows = sqlx::query(&sql)
                .bind(user.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list notifications"))?;
            rows.iter().map(notification_from_row).collect()
        })
    }

    fn mark_notification_read(&self, id: NotificationId, user: UserId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result =
                sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                    .bind(id.as_uuid())
                    .bind(user.as_uuid())
                    .execute(&self.pool)
                    .await
                    .map_err(db_error("Failed to mark notification read"))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn mark_all_notifications_read(&self, user: UserId) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
            )
            .bind(user.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to mark notifications read"))?;
            Ok(result.rows_affected())
        })
    }
}
