//! Fitbook booking service.
//!
//! Members book seats in fitness classes that instructors publish. This
//! crate holds the application: the rules that keep a class's participant
//! list and its bookings consistent, and the HTTP API around them.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────────┐
//!   HTTP (axum) ───► │ api::* handlers          │ ◄── auth::SessionUser
//!                    └────────────┬─────────────┘
//!                                 │
//!        ┌──────────────┬─────────┴──────┬───────────────┬─────────────┐
//!        ▼              ▼                ▼               ▼             ▼
//!  BookingEngine  ClassLifecycle     Notifier         Queries     UserService
//!        │   └──── ClassLocks ───┘       ▲               │             │
//!        │                               │               │             │
//!        └──── notify (best effort) ─────┘               │             │
//!                                 │                      │             │
//!                                 ▼                      ▼             ▼
//!                    ┌──────────────────────────────────────────────────┐
//!                    │ EntityStore (PostgreSQL or in-memory)            │
//!                    └──────────────────────────────────────────────────┘
//! ```
//!
//! # Consistency
//!
//! 1. A class never holds more participants than `max_participants`.
//! 2. A user holds at most one active booking per class.
//! 3. A user is a participant of a class exactly when they hold an active
//!    booking for it.
//!
//! Within a process the [`ClassLocks`](locks::ClassLocks) table serializes
//! writers per class. Across processes the store's conditional participant
//! add and its unique `(user, class)` booking index hold the line.
//!
//! # Modules
//!
//! - [`engine`]: book, cancel and delete bookings
//! - [`lifecycle`]: instructors create, edit and delete classes
//! - [`notifications`]: best-effort notifications and the inbox
//! - [`queries`]: listings
//! - [`users`]: profile and instructor upgrade
//! - [`server`], [`api`], [`auth`]: HTTP surface
//! - [`config`], [`metrics`]: ambient setup

pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod lifecycle;
pub mod locks;
pub mod metrics;
pub mod notifications;
pub mod queries;
pub mod server;
pub mod users;

pub use config::Config;
pub use engine::{BookClassRequest, BookingEngine, CancelMode, CancelOutcome, CancelTarget};
pub use lifecycle::{ClassAction, ClassLifecycle, NewClass, ensure_instructor};
pub use locks::ClassLocks;
pub use notifications::Notifier;
pub use queries::{BookingView, ClassView, MyBookings, Queries};
pub use server::{AppState, build_router};
pub use users::UserService;
