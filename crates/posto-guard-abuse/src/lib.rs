//! # Posto Guard Abuse
//!
//! Per-client rate limiting and temporary blocking.
//!
//! ## Overview
//!
//! - [`RateLimiter`] counts requests per client in fixed windows and reports
//!   [`RateDecision::Denied`] once the quota is spent. It never blocks anyone
//!   itself.
//! - [`Blocklist`] holds `blocked_until` per client, expired lazily on lookup.
//! - [`AbuseShield`] composes the two: an active block rejects first; a
//!   denial from the limiter inserts a block and rejects.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use posto_guard_abuse::{AbuseShield, BlockConfig, RateLimitConfig};
//! use posto_guard_core::ClientId;
//!
//! let shield = AbuseShield::new(RateLimitConfig::default(), BlockConfig::default()).unwrap();
//! let client = ClientId::new("203.0.113.5").unwrap();
//!
//! match shield.admit(&client) {
//!     Ok(()) => { /* hand the request to its handler */ }
//!     Err(e) => println!("rejected: {e}"),
//! }
//! ```
//!
//! ## Concurrency
//!
//! Both maps are sharded; every per-client update happens under that
//! client's shard lock, so concurrent requests from one client cannot exceed
//! the quota and concurrent blocks never shorten each other.

pub mod blocklist;
pub mod error;
pub mod rate;
pub mod shield;

pub use blocklist::{BlockConfig, BlockEntry, BlockStatus, Blocklist, DEFAULT_BLOCK_SECS};
pub use error::{AbuseError, Result};
pub use rate::{
    RateDecision, RateLimitConfig, RateLimiter, DEFAULT_MAX_REQUESTS, DEFAULT_SWEEP_EVERY,
    DEFAULT_WINDOW_SECS,
};
pub use shield::AbuseShield;
