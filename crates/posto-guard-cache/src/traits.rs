//! KeyStore trait: the abstract interface for holding derived user keys.
//!
//! Consumers (content encryption, the request gate) depend on this trait so
//! tests can substitute their own store.

use posto_guard_core::UserId;
use posto_guard_crypto::UserKey;

use crate::error::{CacheError, Result};

/// A process-local map from user id to derived key.
///
/// # Design Notes
///
/// - **Volatile**: implementations must not persist keys. After a restart
///   every user is absent until they authenticate again.
/// - **Linearizable per user**: a `get` racing a `put` for the same user sees
///   either the old key or the complete new key.
/// - **Copies out**: `get` hands back an owned copy; callers drop it after a
///   single cipher operation.
pub trait KeyStore: Send + Sync {
    /// Insert or overwrite the key for a user.
    fn put(&self, user: UserId, key: UserKey);

    /// Get a copy of the user's key, if present.
    fn get(&self, user: UserId) -> Option<UserKey>;

    /// Remove the user's key. Returns whether a key was present.
    fn remove(&self, user: UserId) -> bool;

    /// Check whether a key is present for the user.
    fn contains(&self, user: UserId) -> bool;

    /// Number of cached keys.
    fn len(&self) -> usize;

    /// Whether the store holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extension trait for common key store patterns.
pub trait KeyStoreExt: KeyStore {
    /// Get the user's key or fail with [`CacheError::KeyUnavailable`].
    fn require(&self, user: UserId) -> Result<UserKey>;
}

impl<S: KeyStore + ?Sized> KeyStoreExt for S {
    fn require(&self, user: UserId) -> Result<UserKey> {
        self.get(user).ok_or(CacheError::KeyUnavailable(user))
    }
}
