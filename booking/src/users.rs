//! User profile and role management.

use fitbook_core::error::Result;
use fitbook_core::{BookingError, EntityStore, Role, User, UserId};
use std::sync::Arc;

/// Looks up users and upgrades members to instructors.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn EntityStore>,
}

impl UserService {
    /// Create the service.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Load the user a verified credential belongs to.
    ///
    /// # Errors
    ///
    /// [`BookingError::Unauthorized`] when the user no longer exists.
    pub async fn resolve(&self, id: UserId) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| BookingError::Unauthorized("User not found".to_string()))
    }

    /// Fresh copy of the caller's profile.
    ///
    /// # Errors
    ///
    /// [`BookingError::NotFound`] when the user was removed meanwhile.
    pub async fn profile(&self, user: &User) -> Result<User> {
        self.store
            .get_user(user.id)
            .await?
            .ok_or_else(|| BookingError::NotFound("User not found".to_string()))
    }

    /// Promote a member to instructor.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Conflict`]: already an instructor
    /// - [`BookingError::NotFound`]: the user was removed meanwhile
    #[tracing::instrument(skip_all, fields(user_id = %user.id))]
    pub async fn upgrade_to_instructor(&self, user: &User) -> Result<User> {
        if user.is_instructor() {
            return Err(BookingError::Conflict(
                "User is already an instructor".to_string(),
            ));
        }

        let upgraded = self
            .store
            .set_user_role(user.id, Role::Instructor)
            .await?
            .ok_or_else(|| BookingError::NotFound("User not found".to_string()))?;

        tracing::info!("User upgraded to instructor");
        Ok(upgraded)
    }
}
