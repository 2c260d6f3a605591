//! # Posto Guard
//!
//! The security layer of the Posto blogging service: per-user encryption of
//! private posts and per-client abuse defense.
//!
//! ## Overview
//!
//! - **Key derivation**: Argon2id turns a user's password and per-account
//!   salt into a 32-byte content key at login or registration.
//! - **Key cache**: derived keys live only in process memory, keyed by user
//!   id, until logout or restart.
//! - **Content cipher**: private post titles and bodies are sealed with an
//!   AEAD under the owner's key; public posts pass through unchanged.
//! - **Request gate**: a blocklist and a fixed-window rate limiter reject
//!   abusive clients; authenticated routes also require a cached key.
//!
//! ## Key Concepts
//!
//! - **Envelope**: `base64(nonce || ciphertext || tag)`, self-contained.
//! - **Key unavailable**: a valid session with no cached key means the
//!   process restarted or the user logged out; force a fresh login.
//! - **Block**: a client that exceeds its quota is rejected for a fixed
//!   duration, then starts over with a fresh window.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use posto_guard::{Guard, GuardConfig};
//! use posto_guard::core::{ClientId, SessionUser, UserId, Visibility};
//!
//! async fn example() -> posto_guard::Result<()> {
//!     let guard = Guard::new(GuardConfig::default())?;
//!     let alice = SessionUser::new(1, "alice");
//!
//!     // Account creation returns the salt to store with the account.
//!     let salt = guard.register(alice.id, b"correct horse").await?;
//!
//!     // Later, after the password is verified:
//!     guard.login(alice.id, b"correct horse", salt.as_bytes()).await?;
//!
//!     // Every request passes the gate first.
//!     let client = ClientId::new("203.0.113.7")?;
//!     let user = guard.gate().admit_required(&client, Some(&alice))?;
//!
//!     let sealed = guard.protect("Diary", "Dear diary", Visibility::Private, user.id)?;
//!     let opened = guard.reveal(&sealed.title, &sealed.body, Visibility::Private, user.id)?;
//!     assert_eq!(opened.body, "Dear diary");
//!
//!     guard.logout(user.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `posto_guard::core` - Identities, visibility, clocks
//! - `posto_guard::crypto` - Key derivation and envelopes
//! - `posto_guard::cache` - Key store trait and in-memory cache
//! - `posto_guard::abuse` - Rate limiter and blocklist

pub mod config;
pub mod content;
pub mod error;
pub mod gate;
pub mod guard;
pub mod telemetry;

// Re-export component crates
pub use posto_guard_abuse as abuse;
pub use posto_guard_cache as cache;
pub use posto_guard_core as core;
pub use posto_guard_crypto as crypto;

// Re-export main types for convenience
pub use config::GuardConfig;
pub use content::{ContentCipher, PostText};
pub use error::{GuardError, Result};
pub use gate::{GateOutcome, SecurityGate};
pub use guard::Guard;
pub use telemetry::init_tracing;

// Re-export commonly used component types
pub use posto_guard_cache::{KeyCache, KeyStore};
pub use posto_guard_core::{ClientId, SessionUser, UserId, Visibility};
pub use posto_guard_crypto::{Salt, UserKey};
