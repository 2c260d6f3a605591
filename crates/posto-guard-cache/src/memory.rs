//! In-memory implementation of the KeyStore trait.
//!
//! Keys live only as long as the process. The map is sharded so reads and
//! writes for unrelated users never contend on a single lock.

use dashmap::DashMap;
use posto_guard_core::UserId;
use posto_guard_crypto::UserKey;

use crate::traits::KeyStore;

/// Process-wide cache of derived user keys.
///
/// Thread-safe via a sharded map; each entry is replaced whole, so a reader
/// never observes a partially written key.
#[derive(Debug, Default)]
pub struct KeyCache {
    keys: DashMap<UserId, UserKey>,
}

impl KeyCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            keys: DashMap::new(),
        }
    }

    /// Drop every cached key.
    pub fn clear(&self) {
        self.keys.clear();
    }
}

impl KeyStore for KeyCache {
    fn put(&self, user: UserId, key: UserKey) {
        // The displaced key, if any, is wiped when it drops here.
        let replaced = self.keys.insert(user, key).is_some();
        tracing::debug!(user_id = %user, replaced, "user key cached");
    }

    fn get(&self, user: UserId) -> Option<UserKey> {
        self.keys.get(&user).map(|entry| entry.value().clone())
    }

    fn remove(&self, user: UserId) -> bool {
        let removed = self.keys.remove(&user).is_some();
        if removed {
            tracing::debug!(user_id = %user, "user key removed");
        }
        removed
    }

    fn contains(&self, user: UserId) -> bool {
        self.keys.contains_key(&user)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}
