//! The Guard: unified API for the Posto security layer.
//!
//! The Guard owns the key cache, the post cipher, and the request gate, and
//! wires them to one configuration and one clock.

use std::sync::Arc;

use dashmap::DashMap;
use posto_guard_abuse::AbuseShield;
use posto_guard_cache::{KeyCache, KeyStore};
use posto_guard_core::{Clock, SystemClock, UserId, Visibility};
use posto_guard_crypto::{KeyDeriver, Salt, UserKey};
use zeroize::Zeroizing;

use crate::config::GuardConfig;
use crate::content::{ContentCipher, PostText};
use crate::error::{GuardError, Result};
use crate::gate::SecurityGate;

/// The main Guard struct.
///
/// Provides a unified API for:
/// - Deriving and caching user keys on login and registration
/// - Dropping keys on logout
/// - Encrypting and decrypting private post text
/// - Gating requests by rate, block status, and key presence
pub struct Guard<K: KeyStore = KeyCache> {
    /// Configuration.
    config: GuardConfig,
    /// Argon2id deriver built from the configuration.
    deriver: KeyDeriver,
    /// Shared key store.
    keys: Arc<K>,
    /// Post cipher over the key store.
    content: ContentCipher<K>,
    /// Request gate over the key store.
    gate: SecurityGate<K>,
    /// Per-user logout count; a login only installs its key if none happened
    /// while it was deriving.
    generations: DashMap<UserId, u64>,
}

impl Guard<KeyCache> {
    /// Create a guard with an in-memory key cache and the system clock.
    pub fn new(config: GuardConfig) -> Result<Self> {
        Self::with_store(config, KeyCache::new(), Arc::new(SystemClock))
    }

    /// Create a guard with an in-memory key cache and a custom clock.
    pub fn with_clock(config: GuardConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_store(config, KeyCache::new(), clock)
    }
}

impl<K: KeyStore> Guard<K> {
    /// Create a guard over any key store.
    pub fn with_store(config: GuardConfig, store: K, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let deriver = KeyDeriver::new(config.kdf, config.password)?;
        let shield = Arc::new(AbuseShield::new(config.rate_limit, config.block)?);
        let keys = Arc::new(store);

        Ok(Self {
            content: ContentCipher::new(Arc::clone(&keys)),
            gate: SecurityGate::new(shield, Arc::clone(&keys), clock),
            deriver,
            keys,
            config,
            generations: DashMap::new(),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Get the key store.
    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Get the request gate.
    pub fn gate(&self) -> &SecurityGate<K> {
        &self.gate
    }

    /// Get the post cipher.
    pub fn content(&self) -> &ContentCipher<K> {
        &self.content
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Derive `user`'s key from `(password, salt)` and cache it.
    ///
    /// The caller has already verified the password. Input is checked up
    /// front; the memory-hard derivation runs on the blocking pool so async
    /// workers stay responsive. A [`Guard::logout`] that lands while the
    /// derivation runs wins: the key is discarded and the login fails with
    /// [`GuardError::LoginSuperseded`].
    pub async fn login(&self, user: UserId, password: &[u8], salt: &[u8]) -> Result<()> {
        if !user.is_valid() {
            return Err(GuardError::InvalidInput(format!("invalid user id {user}")));
        }
        let salt = Salt::from_slice(salt)?;
        self.deriver.policy().check(password)?;

        self.derive_and_cache(user, password, salt).await?;
        tracing::info!(user_id = %user, "user key derived on login");
        Ok(())
    }

    /// Set up keying for a newly created account.
    ///
    /// Generates a fresh salt, derives and caches the key, and returns the
    /// salt for the account record.
    pub async fn register(&self, user: UserId, password: &[u8]) -> Result<Salt> {
        if !user.is_valid() {
            return Err(GuardError::InvalidInput(format!("invalid user id {user}")));
        }
        self.deriver.policy().check(password)?;

        let salt = Salt::generate();
        self.derive_and_cache(user, password, salt).await?;
        tracing::info!(user_id = %user, "user key derived on registration");
        Ok(salt)
    }

    /// Drop `user`'s key. Returns whether one was cached.
    ///
    /// Any login for `user` still deriving its key will not install it.
    pub fn logout(&self, user: UserId) -> bool {
        let mut generation = self.generations.entry(user).or_insert(0);
        *generation += 1;
        self.keys.remove(user)
    }

    /// Check if `user` has a key in this process.
    pub fn has_key(&self, user: UserId) -> bool {
        self.keys.contains(user)
    }

    async fn derive_and_cache(&self, user: UserId, password: &[u8], salt: Salt) -> Result<()> {
        let epoch = self.session_epoch(user);
        let deriver = self.deriver.clone();
        let password = Zeroizing::new(password.to_vec());

        let key = tokio::task::spawn_blocking(move || deriver.derive_with_salt(&password, &salt))
            .await??;

        self.install_key(user, epoch, key)
    }

    fn session_epoch(&self, user: UserId) -> u64 {
        self.generations.get(&user).map_or(0, |g| *g)
    }

    /// Cache `key` unless `user` logged out since `epoch` was read.
    fn install_key(&self, user: UserId, epoch: u64, key: UserKey) -> Result<()> {
        // Held across the put so a concurrent logout orders before or after it.
        let generation = self.generations.entry(user).or_insert(0);
        if *generation != epoch {
            tracing::warn!(user_id = %user, "logout during key derivation; key discarded");
            return Err(GuardError::LoginSuperseded { user_id: user });
        }
        self.keys.put(user, key);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────────

    /// Prepare post text for storage. See [`ContentCipher::protect`].
    pub fn protect(
        &self,
        title: &str,
        body: &str,
        visibility: Visibility,
        owner: UserId,
    ) -> Result<PostText> {
        self.content.protect(title, body, visibility, owner)
    }

    /// Recover post text from storage. See [`ContentCipher::reveal`].
    pub fn reveal(
        &self,
        title: &str,
        body: &str,
        visibility: Visibility,
        owner: UserId,
    ) -> Result<PostText> {
        self.content.reveal(title, body, visibility, owner)
    }
}
