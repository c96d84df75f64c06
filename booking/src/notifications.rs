//! Notification emitter and inbox.
//!
//! [`Notifier::emit`] is best-effort: a failed write is logged and counted but
//! never surfaces to the operation that triggered it. Reading and
//! acknowledging notifications goes through the same type.

use crate::metrics;
use chrono::NaiveDate;
use fitbook_core::environment::Clock;
use fitbook_core::error::Result;
use fitbook_core::{
    Booking, BookingError, ClassId, EntityStore, Notification, NotificationId, NotificationKind,
    UserId,
};
use std::sync::Arc;

/// Title of the notification sent after a successful booking.
pub const BOOKING_CONFIRMED_TITLE: &str = "Class Booked Successfully";

/// Appends notifications to a user's inbox and serves the inbox back.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
}

impl Notifier {
    /// Create a notifier writing through `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Append a notification. Failures are logged and swallowed.
    ///
    /// Returns the stored notification, or `None` if the write failed.
    pub async fn emit(
        &self,
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        class_id: Option<ClassId>,
    ) -> Option<Notification> {
        let notification = Notification {
            id: NotificationId::new(),
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            read: false,
            class_id,
            created_at: self.clock.now(),
        };

        match self.store.insert_notification(notification.clone()).await {
            Ok(()) => {
                tracing::debug!(%user_id, notification_id = %notification.id, kind = kind.as_str(), "Notification stored");
                Some(notification)
            }
            Err(e) => {
                tracing::warn!(%user_id, kind = kind.as_str(), error = %e, "Failed to store notification");
                metrics::record_notification_failed();
                None
            }
        }
    }

    /// Tell the booking's owner their seat is confirmed.
    pub async fn booking_confirmed(&self, booking: &Booking) -> Option<Notification> {
        self.emit(
            booking.user_id,
            BOOKING_CONFIRMED_TITLE,
            booking_confirmed_message(&booking.class_name, booking.date, &booking.time),
            NotificationKind::Booking,
            Some(booking.class_id),
        )
        .await
    }

    /// The user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Internal`] if the store fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>> {
        Ok(self.store.list_notifications(user_id).await?)
    }

    /// Mark one of the user's notifications as read.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] when the notification does not exist
    /// or belongs to someone else.
    pub async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<()> {
        if self.store.mark_notification_read(id, user_id).await? {
            Ok(())
        } else {
            Err(BookingError::NotFound("Notification not found".to_string()))
        }
    }

    /// Mark every notification of the user as read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Internal`] if the store fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        Ok(self.store.mark_all_notifications_read(user_id).await?)
    }
}

/// `"You have booked {class_name} on {date} at {time}"`, date as `M/D/YYYY`.
#[must_use]
pub fn booking_confirmed_message(class_name: &str, date: NaiveDate, time: &str) -> String {
    format!(
        "You have booked {class_name} on {} at {time}",
        date.format("%-m/%-d/%Y")
    )
}
