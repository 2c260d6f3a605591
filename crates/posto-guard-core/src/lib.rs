//! # Posto Guard Core
//!
//! Pure primitives shared by the Posto security layer: user and client
//! identities, the typed session payload, post visibility, and time.
//!
//! This crate contains no I/O and no shared state.
//!
//! ## Key Types
//!
//! - [`UserId`] - Authenticated application user
//! - [`ClientId`] - Network-level identity used for abuse tracking
//! - [`SessionUser`] - Typed payload carried by a session cookie
//! - [`Visibility`] - Public or owner-only post content
//! - [`Clock`] - Source of Unix-millisecond timestamps

pub mod error;
pub mod time;
pub mod types;

pub use error::{CoreError, Result};
pub use time::{duration_millis, now_millis, remaining, Clock, ManualClock, SystemClock};
pub use types::{ClientId, SessionUser, UserId, Visibility};
