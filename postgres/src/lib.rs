//! `PostgreSQL` storage for the Fitbook booking service.
//!
//! This crate provides [`PostgresEntityStore`], the production implementation
//! of the `EntityStore` trait from `fitbook-core`, and
//! [`PostgresIdentityVerifier`], which resolves bearer tokens through the
//! `sessions` table.
//!
//! The store upholds the two guarantees the booking engine relies on:
//!
//! - the `bookings_user_class_unique` constraint allows one row per
//!   `(user, class)` pair
//! - participants live in a `UUID[]` column and are added with a single
//!   conditional `UPDATE`, so presence and capacity are checked atomically
//!
//! # Example
//!
//! ```ignore
//! use fitbook_postgres::PostgresEntityStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresEntityStore::connect("postgres://localhost/fitbook", 10).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod identity;
mod rows;
mod store;

pub use identity::PostgresIdentityVerifier;
pub use store::PostgresEntityStore;
