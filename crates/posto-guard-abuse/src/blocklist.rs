//! Temporary client blocklist.
//!
//! A blocked client stays blocked until `blocked_until`. Expiry is lazy: the
//! entry is removed by the first lookup at or after that instant, not by a
//! background task.

use std::time::Duration;

use dashmap::DashMap;
use posto_guard_core::{duration_millis, now_millis, remaining, ClientId};
use serde::{Deserialize, Serialize};

use crate::error::{AbuseError, Result};

/// Default block duration in seconds (24 hours).
pub const DEFAULT_BLOCK_SECS: u64 = 24 * 60 * 60;

/// Configuration for the blocklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// How long a client stays blocked after exceeding its quota.
    pub block_secs: u64,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            block_secs: DEFAULT_BLOCK_SECS,
        }
    }
}

impl BlockConfig {
    /// Reject a zero block duration.
    pub fn validate(&self) -> Result<()> {
        if self.block_secs == 0 {
            return Err(AbuseError::InvalidConfig(
                "block_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Block duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.block_secs)
    }
}

/// A blocked client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    /// The blocked client.
    pub client: ClientId,
    /// End of the block (Unix ms, exclusive).
    pub blocked_until: i64,
}

impl BlockEntry {
    /// Check if the block is still in force at `now`.
    pub fn is_active(&self, now: i64) -> bool {
        now < self.blocked_until
    }
}

/// Result of a blocklist lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// No block on record.
    Clear,
    /// An expired block was found and removed by this lookup.
    Lifted,
    /// The client is blocked.
    Blocked {
        /// End of the block (Unix ms).
        until: i64,
        /// Time left on the block.
        retry_after: Duration,
    },
}

impl BlockStatus {
    /// Check if the client is currently blocked.
    pub fn is_blocked(&self) -> bool {
        matches!(self, BlockStatus::Blocked { .. })
    }
}

/// Concurrent map of blocked clients.
#[derive(Debug)]
pub struct Blocklist {
    config: BlockConfig,
    entries: DashMap<ClientId, i64>,
}

impl Blocklist {
    /// Create a blocklist with a validated configuration.
    pub fn new(config: BlockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            entries: DashMap::new(),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &BlockConfig {
        &self.config
    }

    /// Look up `client` now.
    pub fn check(&self, client: &ClientId) -> BlockStatus {
        self.check_at(client, now_millis())
    }

    /// Look up `client` at `now`, lifting an expired block.
    pub fn check_at(&self, client: &ClientId, now: i64) -> BlockStatus {
        let Some(until) = self.entries.get(client).map(|e| *e.value()) else {
            return BlockStatus::Clear;
        };

        if now < until {
            return BlockStatus::Blocked {
                until,
                retry_after: remaining(now, until),
            };
        }

        // Only remove if still expired; a concurrent block may have extended it.
        if self
            .entries
            .remove_if(client, |_, until| now >= *until)
            .is_some()
        {
            tracing::debug!(client = %client, "block expired");
            return BlockStatus::Lifted;
        }

        match self.entries.get(client).map(|e| *e.value()) {
            Some(until) if now < until => BlockStatus::Blocked {
                until,
                retry_after: remaining(now, until),
            },
            _ => BlockStatus::Clear,
        }
    }

    /// Block `client` for the configured duration starting now.
    pub fn block(&self, client: &ClientId) -> i64 {
        self.block_at(client, now_millis())
    }

    /// Block `client` for the configured duration starting at `now`.
    ///
    /// Concurrent calls for the same client keep the latest end time, so a
    /// block is never shortened. Returns the effective end of the block.
    pub fn block_at(&self, client: &ClientId, now: i64) -> i64 {
        let until = now.saturating_add(duration_millis(self.config.duration()));

        let mut entry = self.entries.entry(client.clone()).or_insert(until);
        if *entry < until {
            *entry = until;
        }
        *entry
    }

    /// Remove a block early. Returns whether one was present.
    pub fn unblock(&self, client: &ClientId) -> bool {
        self.entries.remove(client).is_some()
    }

    /// Get the block on record for `client`, active or not.
    pub fn entry(&self, client: &ClientId) -> Option<BlockEntry> {
        self.entries.get(client).map(|e| BlockEntry {
            client: e.key().clone(),
            blocked_until: *e.value(),
        })
    }

    /// Drop every block that has expired by `now`. Returns how many went.
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, until| now < *until);
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries on record, including expired ones not yet lifted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the blocklist is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T0: i64 = 1_700_000_000_000;
    const HOUR: i64 = 60 * 60 * 1000;

    fn blocklist(block_secs: u64) -> Blocklist {
        Blocklist::new(BlockConfig { block_secs }).unwrap()
    }

    fn client(s: &str) -> ClientId {
        ClientId::new(s).unwrap()
    }

    #[test]
    fn test_unknown_client_is_clear() {
        let list = blocklist(60);
        assert_eq!(list.check_at(&client("1.1.1.1"), T0), BlockStatus::Clear);
    }

    #[test]
    fn test_block_and_expiry() {
        let list = blocklist(24 * 60 * 60);
        let c = client("1.2.3.4");

        let until = list.block_at(&c, T0);
        assert_eq!(until, T0 + 24 * HOUR);

        match list.check_at(&c, until - 1_000) {
            BlockStatus::Blocked { retry_after, .. } => {
                assert_eq!(retry_after, Duration::from_secs(1));
            }
            other => panic!("expected block, got {other:?}"),
        }

        assert_eq!(list.check_at(&c, until), BlockStatus::Lifted);
        assert!(list.entry(&c).is_none());
        assert_eq!(list.check_at(&c, until + 1), BlockStatus::Clear);
    }

    #[test]
    fn test_expired_entry_stays_until_looked_up() {
        let list = blocklist(10);
        let c = client("idle");

        list.block_at(&c, T0);
        assert_eq!(list.len(), 1);

        let entry = list.entry(&c).unwrap();
        assert!(!entry.is_active(T0 + 20_000));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_block_never_shortens() {
        let list = blocklist(100);
        let c = client("racer");

        let later = list.block_at(&c, T0 + 50_000);
        let earlier = list.block_at(&c, T0);

        assert_eq!(earlier, later);
        assert_eq!(list.entry(&c).unwrap().blocked_until, T0 + 150_000);
    }

    #[test]
    fn test_unblock() {
        let list = blocklist(100);
        let c = client("pardoned");

        list.block_at(&c, T0);
        assert!(list.unblock(&c));
        assert_eq!(list.check_at(&c, T0 + 1), BlockStatus::Clear);
    }

    #[test]
    fn test_purge_expired() {
        let list = blocklist(10);
        list.block_at(&client("a"), T0);
        list.block_at(&client("b"), T0 + 20_000);

        assert_eq!(list.purge_expired(T0 + 15_000), 1);
        assert!(list.entry(&client("b")).is_some());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Blocklist::new(BlockConfig { block_secs: 0 }).is_err());
    }

    #[test]
    fn test_concurrent_blocks_keep_full_duration() {
        let list = blocklist(60);
        let c = client("swarm");

        std::thread::scope(|s| {
            for i in 0..8i64 {
                let list = &list;
                let c = &c;
                s.spawn(move || {
                    list.block_at(c, T0 + i);
                });
            }
        });

        let until = list.entry(&c).unwrap().blocked_until;
        assert_eq!(until, T0 + 7 + 60_000);
    }

    proptest! {
        #[test]
        fn prop_block_end_is_latest_start_plus_duration(
            block_secs in 1u64..100_000,
            starts in prop::collection::vec(0i64..10_000_000, 1..30),
        ) {
            let list = blocklist(block_secs);
            let c = client("prop");

            let mut latest = i64::MIN;
            for start in &starts {
                let until = list.block_at(&c, T0 + start);
                latest = latest.max(T0 + start);
                prop_assert_eq!(until, latest + block_secs as i64 * 1000);
            }
            prop_assert_eq!(list.entry(&c).unwrap().blocked_until, latest + block_secs as i64 * 1000);
        }

        #[test]
        fn prop_lookup_agrees_with_block_end(
            block_secs in 1u64..100_000,
            offset in -1_000i64..200_000_000,
        ) {
            let list = blocklist(block_secs);
            let c = client("prop");
            let until = list.block_at(&c, T0);
            let now = T0 + offset;

            match list.check_at(&c, now) {
                BlockStatus::Blocked { until: reported, retry_after } => {
                    prop_assert!(now < until);
                    prop_assert_eq!(reported, until);
                    prop_assert_eq!(retry_after, Duration::from_millis((until - now) as u64));
                }
                BlockStatus::Lifted => {
                    prop_assert!(now >= until);
                    prop_assert!(list.is_empty());
                }
                BlockStatus::Clear => prop_assert!(false, "block vanished before lookup"),
            }
        }
    }
}
