//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use posto_guard::{Guard, GuardConfig};
use posto_guard_core::{ClientId, ManualClock, SessionUser, UserId};
use posto_guard_crypto::{KdfParams, KeyDeriver, PasswordPolicy, Salt};
use rand::Rng;

/// Fixed start time for fixture clocks (2023-11-14T22:13:20Z).
pub const FIXTURE_EPOCH_MS: i64 = 1_700_000_000_000;

/// Argon2id costs low enough for tests to derive keys in microseconds.
pub fn fast_kdf_params() -> KdfParams {
    KdfParams {
        time_cost: 1,
        memory_kib: 64,
        parallelism: 1,
    }
}

/// Default configuration with cheap KDF costs.
pub fn fast_config() -> GuardConfig {
    GuardConfig {
        kdf: fast_kdf_params(),
        ..GuardConfig::default()
    }
}

/// A deriver with cheap KDF costs and the default password policy.
pub fn fast_deriver() -> KeyDeriver {
    KeyDeriver::new(fast_kdf_params(), PasswordPolicy::default())
        .expect("fast KDF params are valid")
}

/// Route `tracing` output through the test harness's captured stdout.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A guard on a manual clock.
pub struct TestFixture {
    pub guard: Guard,
    pub clock: Arc<ManualClock>,
}

impl TestFixture {
    /// Create a fixture with [`fast_config`].
    pub fn new() -> Self {
        Self::with_config(fast_config()).expect("fast config is valid")
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: GuardConfig) -> anyhow::Result<Self> {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH_MS));
        let guard = Guard::with_clock(config, clock.clone()).context("building guard")?;
        Ok(Self { guard, clock })
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// A client identity.
    pub fn client(&self, id: &str) -> ClientId {
        ClientId::new(id).expect("fixture client ids are non-empty")
    }

    /// A client identity from a random documentation-range IPv4 address.
    pub fn random_client(&self) -> ClientId {
        let mut rng = rand::thread_rng();
        let ip = Ipv4Addr::new(203, 0, 113, rng.gen());
        ClientId::from(IpAddr::V4(ip))
    }

    /// Register `username` with `password` and return its session payload
    /// and salt. The key is cached on return.
    pub async fn register_user(
        &self,
        id: u64,
        username: &str,
        password: &str,
    ) -> anyhow::Result<(SessionUser, Salt)> {
        let user = SessionUser::new(id, username);
        let salt = self
            .guard
            .register(user.id, password.as_bytes())
            .await
            .with_context(|| format!("registering {username}"))?;
        Ok((user, salt))
    }

    /// Log `user` in with `password` and `salt`.
    pub async fn login(&self, user: UserId, password: &str, salt: &Salt) -> anyhow::Result<()> {
        self.guard
            .login(user, password.as_bytes(), salt.as_bytes())
            .await
            .with_context(|| format!("logging in user {user}"))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
