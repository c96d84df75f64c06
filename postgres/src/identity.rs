//! Session-table identity verifier.

use chrono::{DateTime, Utc};
use fitbook_core::identity::{IdentityError, IdentityVerifier};
use fitbook_core::types::UserId;
use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Resolves bearer tokens by looking them up in the `sessions` table.
///
/// Sessions are issued elsewhere; this type only reads them.
#[derive(Clone, Debug)]
pub struct PostgresIdentityVerifier {
    pool: PgPool,
}

impl PostgresIdentityVerifier {
    /// Create a verifier over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lookup(&self, token: &str) -> Result<UserId, IdentityError> {
        let row: Option<(Uuid, DateTime<Utc>)> =
            sqlx::query_as("SELECT user_id, expires_at FROM sessions WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| IdentityError::Backend(format!("Failed to load session: {e}")))?;

        let (user_id, expires_at) = row.ok_or(IdentityError::InvalidToken)?;
        if expires_at <= Utc::now() {
            return Err(IdentityError::Expired);
        }
        Ok(UserId::from_uuid(user_id))
    }
}

impl IdentityVerifier for PostgresIdentityVerifier {
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserId, IdentityError>> + Send + 'a>> {
        Box::pin(self.lookup(token))
    }
}
