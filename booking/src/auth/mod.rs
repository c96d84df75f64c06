//! Request authentication.
//!
//! Credentials are opaque bearer tokens. Issuing them is someone else's job;
//! this service only verifies them through the
//! [`IdentityVerifier`](fitbook_core::IdentityVerifier) port and loads the user.

pub mod middleware;

pub use middleware::SessionUser;
