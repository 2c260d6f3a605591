//! Per-client request rate limiting.
//!
//! Each client identity gets a fixed window of `window_secs` that opens on its
//! first request. Up to `max_requests` are allowed inside the window; the
//! next one is denied with the time left until the window closes. A denial
//! is only a signal: the limiter never touches the blocklist.
//!
//! A window can also be held closed until a given instant, after which it
//! reopens with a full quota. The shield uses this to line a client's next
//! window up with the end of its block.
//!
//! Windows that have closed are swept every `sweep_every` calls, so a client
//! seen once does not hold memory forever.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use posto_guard_core::{duration_millis, now_millis, remaining, ClientId};
use serde::{Deserialize, Serialize};

use crate::error::{AbuseError, Result};

/// Default quota per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 60;

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Default number of calls between sweeps of closed windows.
pub const DEFAULT_SWEEP_EVERY: u64 = 1024;

/// Configuration for the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Sweep closed windows every this many calls (0 disables sweeping).
    pub sweep_every: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_secs: DEFAULT_WINDOW_SECS,
            sweep_every: DEFAULT_SWEEP_EVERY,
        }
    }
}

impl RateLimitConfig {
    /// Reject a zero quota or a zero-length window.
    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(AbuseError::InvalidConfig(
                "max_requests must be at least 1".into(),
            ));
        }
        if self.window_secs == 0 {
            return Err(AbuseError::InvalidConfig(
                "window_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Outcome of a rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Within quota.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
    },
    /// Quota exhausted for the current window.
    Denied {
        /// Time until the window closes.
        retry_after: Duration,
    },
}

impl RateDecision {
    /// Check if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Limiter state for one client.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    /// When this client was first tracked (Unix ms).
    created_at: i64,
    /// When the current window opened (Unix ms).
    window_start: i64,
    /// Requests counted in the current window.
    count: u32,
    /// Every request before this instant is denied (Unix ms, 0 when unheld).
    held_until: i64,
}

impl RateWindow {
    fn new(now: i64) -> Self {
        Self {
            created_at: now,
            window_start: now,
            count: 0,
            held_until: 0,
        }
    }

    fn is_closed(&self, now: i64, window_ms: i64) -> bool {
        now >= self.held_until && now.saturating_sub(self.window_start) >= window_ms
    }

    fn hold_until(&mut self, until: i64) {
        if until > self.held_until {
            self.held_until = until;
            self.window_start = until;
            self.count = 0;
        }
    }

    fn check(&mut self, now: i64, max: u32, window_ms: i64) -> RateDecision {
        if now < self.held_until {
            return RateDecision::Denied {
                retry_after: remaining(now, self.held_until),
            };
        }

        if self.is_closed(now, window_ms) {
            self.window_start = now;
            self.count = 0;
        }

        if self.count < max {
            self.count += 1;
            RateDecision::Allowed {
                remaining: max - self.count,
            }
        } else {
            RateDecision::Denied {
                retry_after: remaining(now, self.window_start.saturating_add(window_ms)),
            }
        }
    }
}

/// Concurrent per-client rate limiter.
///
/// Each client's window is updated under its shard's lock, so concurrent
/// requests from one client can never admit more than the quota.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<ClientId, RateWindow>,
    calls: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter with a validated configuration.
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            windows: DashMap::new(),
            calls: AtomicU64::new(0),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `client` now.
    pub fn allow(&self, client: &ClientId) -> RateDecision {
        self.allow_at(client, now_millis())
    }

    /// Count a request from `client` at `now` (Unix ms).
    pub fn allow_at(&self, client: &ClientId, now: i64) -> RateDecision {
        let window_ms = duration_millis(self.config.window());

        let decision = self
            .windows
            .entry(client.clone())
            .or_insert_with(|| RateWindow::new(now))
            .check(now, self.config.max_requests, window_ms);

        // The entry guard is released above; sweeping takes shard locks.
        self.maybe_sweep(now);
        decision
    }

    /// Deny every request from `client` before `until`, then open a fresh
    /// window at `until`.
    ///
    /// Holds never shorten: a later `until` wins over an earlier one.
    pub fn hold_until(&self, client: &ClientId, until: i64) {
        self.windows
            .entry(client.clone())
            .or_insert_with(|| RateWindow::new(until))
            .hold_until(until);
    }

    /// Forget a client so its next request opens a fresh window.
    pub fn reset(&self, client: &ClientId) -> bool {
        self.windows.remove(client).is_some()
    }

    /// When the client was first tracked, if it is tracked.
    pub fn tracked_since(&self, client: &ClientId) -> Option<i64> {
        self.windows.get(client).map(|w| w.created_at)
    }

    /// Drop every window that has closed by `now`. Returns how many went.
    pub fn purge_expired(&self, now: i64) -> usize {
        let window_ms = duration_millis(self.config.window());
        let before = self.windows.len();
        self.windows.retain(|_, w| !w.is_closed(now, window_ms));
        let purged = before.saturating_sub(self.windows.len());
        if purged > 0 {
            tracing::debug!(purged, "swept closed rate windows");
        }
        purged
    }

    /// Number of clients currently tracked.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no client is tracked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn maybe_sweep(&self, now: i64) {
        let every = self.config.sweep_every;
        if every == 0 {
            return;
        }
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if n % every == 0 {
            self.purge_expired(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicU32;

    const T0: i64 = 1_700_000_000_000;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window_secs,
            sweep_every: 0,
        })
        .unwrap()
    }

    fn client(s: &str) -> ClientId {
        ClientId::new(s).unwrap()
    }

    #[test]
    fn test_quota_then_deny() {
        let limiter = limiter(60, 60);
        let c = client("10.0.0.1");

        for i in 0..60 {
            let d = limiter.allow_at(&c, T0 + i * 500);
            assert!(d.is_allowed(), "request {i} should be allowed");
        }

        match limiter.allow_at(&c, T0 + 30_000) {
            RateDecision::Denied { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(30));
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = limiter(3, 60);
        let c = client("a");

        assert_eq!(limiter.allow_at(&c, T0), RateDecision::Allowed { remaining: 2 });
        assert_eq!(limiter.allow_at(&c, T0), RateDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.allow_at(&c, T0), RateDecision::Allowed { remaining: 0 });
        assert!(!limiter.allow_at(&c, T0).is_allowed());
    }

    #[test]
    fn test_window_reopens() {
        let limiter = limiter(2, 60);
        let c = client("b");

        limiter.allow_at(&c, T0);
        limiter.allow_at(&c, T0 + 1);
        assert!(!limiter.allow_at(&c, T0 + 59_999).is_allowed());

        assert!(limiter.allow_at(&c, T0 + 60_000).is_allowed());
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 60);

        assert!(limiter.allow_at(&client("x"), T0).is_allowed());
        assert!(!limiter.allow_at(&client("x"), T0).is_allowed());
        assert!(limiter.allow_at(&client("y"), T0).is_allowed());
    }

    #[test]
    fn test_reset_starts_fresh_window() {
        let limiter = limiter(1, 60);
        let c = client("z");

        limiter.allow_at(&c, T0);
        assert!(!limiter.allow_at(&c, T0 + 1).is_allowed());

        assert!(limiter.reset(&c));
        assert!(limiter.allow_at(&c, T0 + 2).is_allowed());
    }

    #[test]
    fn test_hold_denies_then_reopens_full() {
        let limiter = limiter(3, 60);
        let c = client("held");

        limiter.allow_at(&c, T0);
        let until = T0 + 3_600_000;
        limiter.hold_until(&c, until);

        assert_eq!(
            limiter.allow_at(&c, until - 1_000),
            RateDecision::Denied {
                retry_after: Duration::from_secs(1)
            }
        );
        // Still held after its window would otherwise have closed.
        assert_eq!(limiter.purge_expired(T0 + 120_000), 0);

        for left in (0..3).rev() {
            assert_eq!(
                limiter.allow_at(&c, until),
                RateDecision::Allowed { remaining: left }
            );
        }
        assert!(!limiter.allow_at(&c, until).is_allowed());
    }

    #[test]
    fn test_hold_never_shortens() {
        let limiter = limiter(1, 60);
        let c = client("held-twice");

        limiter.hold_until(&c, T0 + 10_000);
        limiter.hold_until(&c, T0 + 5_000);

        assert!(!limiter.allow_at(&c, T0 + 9_999).is_allowed());
        assert!(limiter.allow_at(&c, T0 + 10_000).is_allowed());
    }

    #[test]
    fn test_purge_expired() {
        let limiter = limiter(5, 60);
        limiter.allow_at(&client("old"), T0);
        limiter.allow_at(&client("new"), T0 + 50_000);
        assert_eq!(limiter.len(), 2);

        assert_eq!(limiter.purge_expired(T0 + 61_000), 1);
        assert_eq!(limiter.len(), 1);
        assert!(limiter.tracked_since(&client("new")).is_some());
        assert!(limiter.tracked_since(&client("old")).is_none());
    }

    #[test]
    fn test_periodic_sweep() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 5,
            window_secs: 1,
            sweep_every: 4,
        })
        .unwrap();

        limiter.allow_at(&client("one-off-1"), T0);
        limiter.allow_at(&client("one-off-2"), T0);
        limiter.allow_at(&client("one-off-3"), T0);
        assert_eq!(limiter.len(), 3);

        // Fourth call lands after the others' windows closed and triggers a sweep.
        limiter.allow_at(&client("late"), T0 + 5_000);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_invalid_config() {
        assert!(RateLimiter::new(RateLimitConfig {
            max_requests: 0,
            ..RateLimitConfig::default()
        })
        .is_err());
        assert!(RateLimiter::new(RateLimitConfig {
            window_secs: 0,
            ..RateLimitConfig::default()
        })
        .is_err());
    }

    #[test]
    fn test_concurrent_same_client_never_exceeds_quota() {
        let limiter = limiter(60, 60);
        let c = client("203.0.113.9");
        let allowed = AtomicU32::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        if limiter.allow_at(&c, T0).is_allowed() {
                            allowed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(allowed.load(Ordering::Relaxed), 60);
    }

    proptest! {
        #[test]
        fn prop_first_window_admits_at_most_quota(
            max in 1u32..10,
            window_secs in 1u64..30,
            gaps in prop::collection::vec(0i64..5_000, 0..200),
        ) {
            let limiter = limiter(max, window_secs);
            let c = client("prop");
            let window_ms = window_secs as i64 * 1000;

            let mut now = T0;
            let mut in_window = 1u32;
            let mut allowed_in_window = u32::from(limiter.allow_at(&c, now).is_allowed());
            for gap in gaps {
                now += gap;
                let decision = limiter.allow_at(&c, now);
                // The first window opens on the first request, at T0.
                if now < T0 + window_ms {
                    in_window += 1;
                    if decision.is_allowed() {
                        allowed_in_window += 1;
                    }
                }
                if let RateDecision::Denied { retry_after } = decision {
                    prop_assert!(retry_after > Duration::ZERO);
                    prop_assert!(retry_after <= Duration::from_secs(window_secs));
                }
            }

            prop_assert_eq!(allowed_in_window, in_window.min(max));
        }

        #[test]
        fn prop_quiet_gap_always_allows(
            max in 1u32..5,
            window_secs in 1u64..30,
            burst in 0usize..20,
            extra in 0i64..100_000,
        ) {
            let limiter = limiter(max, window_secs);
            let c = client("prop");
            for i in 0..burst {
                limiter.allow_at(&c, T0 + i as i64);
            }

            let last = T0 + burst.saturating_sub(1) as i64;
            let later = last + window_secs as i64 * 1000 + extra;
            prop_assert!(limiter.allow_at(&c, later).is_allowed());
        }

        #[test]
        fn prop_hold_denies_until_its_end(
            hold_ms in 1i64..1_000_000,
            samples in prop::collection::vec(any::<prop::sample::Index>(), 1..20),
        ) {
            let limiter = limiter(2, 60);
            let c = client("prop");
            let until = T0 + hold_ms;
            limiter.hold_until(&c, until);

            let mut offsets: Vec<i64> = samples.iter().map(|i| i.index(hold_ms as usize) as i64).collect();
            offsets.sort_unstable();
            for offset in offsets {
                let now = T0 + offset;
                prop_assert_eq!(
                    limiter.allow_at(&c, now),
                    RateDecision::Denied { retry_after: remaining(now, until) }
                );
            }
            prop_assert_eq!(limiter.allow_at(&c, until), RateDecision::Allowed { remaining: 1 });
        }
    }
}
