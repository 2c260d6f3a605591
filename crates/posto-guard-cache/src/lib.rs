//! # Posto Guard Cache
//!
//! Process-local cache of per-user encryption keys.
//!
//! ## Overview
//!
//! A user's key is derived from their password at login or registration and
//! placed in the cache. Every seal or open of private content copies the key
//! out for the duration of one operation. Logout removes it.
//!
//! ## Key Types
//!
//! - [`KeyStore`] - The trait consumers depend on
//! - [`KeyCache`] - Sharded in-memory implementation
//! - [`CacheError`] - `KeyUnavailable` when a user has no key in this process
//!
//! ## Design Notes
//!
//! - **Volatile by choice**: keys are never written to disk, so private
//!   content is unreadable after a restart until its owner logs in again.
//! - **No global lock**: unrelated users never serialize on each other.
//! - **Absent is normal**: a miss is not an alarm, but dependent encryption
//!   must stop with a typed error.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{CacheError, Result};
pub use memory::KeyCache;
pub use traits::{KeyStore, KeyStoreExt};
