//! Static identity verifier for tests.

use fitbook_core::identity::{IdentityError, IdentityVerifier};
use fitbook_core::types::UserId;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

/// Token-to-user map standing in for a real session backend.
///
/// # Example
///
/// ```
/// use fitbook_testing::StaticIdentityVerifier;
/// use fitbook_core::{IdentityVerifier, UserId};
///
/// # async fn example() {
/// let verifier = StaticIdentityVerifier::new();
/// let user = UserId::new();
/// let token = verifier.issue(user);
/// assert_eq!(verifier.verify(&token).await, Ok(user));
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticIdentityVerifier {
    tokens: Arc<RwLock<HashMap<String, UserId>>>,
}

impl StaticIdentityVerifier {
    /// Create a verifier with no known tokens
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh token for `user` and return it.
    #[must_use]
    pub fn issue(&self, user: UserId) -> String {
        let token = format!("test-token-{}", UserId::new());
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), user);
        token
    }

    /// Forget a token.
    pub fn revoke(&self, token: &str) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }
}

impl IdentityVerifier for StaticIdentityVerifier {
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserId, IdentityError>> + Send + 'a>> {
        Box::pin(async move {
            self.tokens
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(token)
                .copied()
                .ok_or(IdentityError::InvalidToken)
        })
    }
}
