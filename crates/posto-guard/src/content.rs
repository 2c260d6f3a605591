//! Post-level encryption policy.
//!
//! Public posts are stored exactly as written so the persistence layer can
//! search them. Private posts have their title and body sealed independently
//! under the owner's cached key.

use std::sync::Arc;

use posto_guard_cache::{KeyStore, KeyStoreExt};
use posto_guard_core::{UserId, Visibility};
use posto_guard_crypto::{open_field, seal_field, Result as CryptoResult, UserKey};

use crate::error::{GuardError, Result};

/// The user-visible text of a post.
///
/// Returned by [`ContentCipher::protect`] holding what to store, and by
/// [`ContentCipher::reveal`] holding what to show. For a private post the
/// stored form of each field is a base64 envelope; for a public post it is
/// the text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostText {
    /// Post title, sealed independently of the body.
    pub title: String,
    /// Post body.
    pub body: String,
}

impl PostText {
    /// Build post text from a title and a body.
    ///
    /// ```rust
    /// use posto_guard::PostText;
    ///
    /// let text = PostText::new("Dear diary", String::from("Nothing happened."));
    /// assert_eq!(text.title, "Dear diary");
    /// assert_eq!(text.body, "Nothing happened.");
    /// ```
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Seals and opens post text with keys from a [`KeyStore`].
pub struct ContentCipher<K: KeyStore> {
    keys: Arc<K>,
}

impl<K: KeyStore> Clone for ContentCipher<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<K: KeyStore> ContentCipher<K> {
    /// Create a cipher over a shared key store.
    pub fn new(keys: Arc<K>) -> Self {
        Self { keys }
    }

    /// Prepare post text for storage.
    ///
    /// Public text passes through unchanged. Private text requires the
    /// owner's key; without it this fails with
    /// [`GuardError::KeyUnavailable`] before anything is sealed.
    pub fn protect(
        &self,
        title: &str,
        body: &str,
        visibility: Visibility,
        owner: UserId,
    ) -> Result<PostText> {
        if visibility.is_public() {
            return Ok(PostText::new(title, body));
        }

        let key = self.key_for(owner)?;
        Ok(PostText {
            title: seal_field(title, &key)?,
            body: seal_field(body, &key)?,
        })
    }

    /// Recover post text from storage.
    ///
    /// Mirrors [`protect`](Self::protect). A private field that fails to
    /// authenticate is an error, never empty text.
    pub fn reveal(
        &self,
        title: &str,
        body: &str,
        visibility: Visibility,
        owner: UserId,
    ) -> Result<PostText> {
        if visibility.is_public() {
            return Ok(PostText::new(title, body));
        }

        let key = self.key_for(owner)?;
        open_post(title, body, &key).map_err(|e| {
            tracing::warn!(user_id = %owner, error = %e, "private post failed to open");
            GuardError::from(e)
        })
    }

    /// The key store this cipher reads from.
    pub fn keys(&self) -> &Arc<K> {
        &self.keys
    }

    fn key_for(&self, owner: UserId) -> Result<UserKey> {
        self.keys.require(owner).map_err(|e| {
            tracing::debug!(user_id = %owner, "no cached key for private content");
            GuardError::from(e)
        })
    }
}

fn open_post(title: &str, body: &str, key: &UserKey) -> CryptoResult<PostText> {
    Ok(PostText {
        title: open_field(title, key)?,
        body: open_field(body, key)?,
    })
}
