//! Blocklist and rate limiter composed into one admission check.
//!
//! ```text
//! Clear --(quota exceeded)--> Blocked(until = now + D) --(now >= until)--> Clear
//! ```
//!
//! An active block rejects before the limiter is consulted, so a blocked
//! client's traffic never advances its window. A limiter denial inserts the
//! block, holds the client's window closed until the block ends, and rejects.
//! The client comes back to a fresh window however its block is removed:
//! lazily on lookup, by `purge_expired`, or early through [`AbuseShield::unblock`].

use posto_guard_core::{now_millis, ClientId};

use crate::blocklist::{BlockConfig, BlockStatus, Blocklist};
use crate::error::{AbuseError, Result};
use crate::rate::{RateDecision, RateLimitConfig, RateLimiter};

/// The abuse-defense half of the request gate.
#[derive(Debug)]
pub struct AbuseShield {
    blocklist: Blocklist,
    limiter: RateLimiter,
}

impl AbuseShield {
    /// Create a shield from validated configurations.
    pub fn new(rate: RateLimitConfig, block: BlockConfig) -> Result<Self> {
        Ok(Self {
            blocklist: Blocklist::new(block)?,
            limiter: RateLimiter::new(rate)?,
        })
    }

    /// Admit or reject a request from `client` now.
    pub fn admit(&self, client: &ClientId) -> Result<()> {
        self.admit_at(client, now_millis())
    }

    /// Admit or reject a request from `client` at `now` (Unix ms).
    pub fn admit_at(&self, client: &ClientId, now: i64) -> Result<()> {
        if let BlockStatus::Blocked { retry_after, .. } = self.blocklist.check_at(client, now) {
            return Err(AbuseError::Blocked { retry_after });
        }

        match self.limiter.allow_at(client, now) {
            RateDecision::Allowed { .. } => Ok(()),
            RateDecision::Denied { .. } => {
                let until = self.blocklist.block_at(client, now);
                self.limiter.hold_until(client, until);
                tracing::warn!(client = %client, blocked_until = until, "rate limit exceeded; client blocked");
                Err(AbuseError::RateExceeded {
                    retry_after: self.blocklist.config().duration(),
                })
            }
        }
    }

    /// Lift a block early and give the client a fresh window.
    ///
    /// Returns whether a block was present.
    pub fn unblock(&self, client: &ClientId) -> bool {
        let removed = self.blocklist.unblock(client);
        self.limiter.reset(client);
        if removed {
            tracing::info!(client = %client, "block lifted early");
        }
        removed
    }

    /// The blocklist.
    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    /// The rate limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
