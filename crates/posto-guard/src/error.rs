//! Error types for the security layer.
//!
//! Component errors are flattened into one taxonomy so the request layer can
//! map each variant to a response without inspecting component crates.

use std::time::Duration;

use posto_guard_abuse::AbuseError;
use posto_guard_cache::CacheError;
use posto_guard_core::{CoreError, UserId};
use posto_guard_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur in the security layer.
///
/// Every variant is scoped to a single request; none is fatal to the process.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Malformed salt, password, or identity, rejected before any crypto.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The user has no key in this process and must log in again.
    #[error("encryption key unavailable for user {user_id}; re-authentication required")]
    KeyUnavailable { user_id: UserId },

    /// The user logged out while this login was deriving their key.
    #[error("user {user_id} logged out during login; key discarded")]
    LoginSuperseded { user_id: UserId },

    /// No valid session user on a route that requires one.
    #[error("authentication required")]
    Unauthenticated,

    /// Tag mismatch or malformed envelope: tampering, corruption, or wrong key.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Sealing failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// This request exceeded the client's quota; the client is now blocked.
    #[error("rate limit exceeded; retry after {}s", .retry_after.as_secs())]
    RateExceeded { retry_after: Duration },

    /// The client is serving an active block.
    #[error("client blocked; retry after {}s", .retry_after.as_secs())]
    Blocked { retry_after: Duration },

    /// Unusable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A key derivation worker did not complete.
    #[error("key derivation task failed: {0}")]
    TaskJoin(String),
}

impl GuardError {
    /// Whether the caller must drop the session and force a fresh login.
    pub fn is_reauth_required(&self) -> bool {
        matches!(
            self,
            GuardError::KeyUnavailable { .. }
                | GuardError::LoginSuperseded { .. }
                | GuardError::Unauthenticated
        )
    }

    /// Whether this is an abuse rejection (rate exceeded or blocked).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GuardError::RateExceeded { .. } | GuardError::Blocked { .. }
        )
    }

    /// The retry-after hint for abuse rejections.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GuardError::RateExceeded { retry_after } | GuardError::Blocked { retry_after } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }
}

impl From<CryptoError> for GuardError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidInput(msg) => GuardError::InvalidInput(msg),
            CryptoError::InvalidParams(msg) => GuardError::Config(msg),
            CryptoError::EncryptionFailed(msg) => GuardError::EncryptionFailed(msg),
            CryptoError::DecryptionFailed(msg) => GuardError::DecryptionFailed(msg),
        }
    }
}

impl From<CacheError> for GuardError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::KeyUnavailable(user_id) => GuardError::KeyUnavailable { user_id },
        }
    }
}

impl From<AbuseError> for GuardError {
    fn from(e: AbuseError) -> Self {
        match e {
            AbuseError::Blocked { retry_after } => GuardError::Blocked { retry_after },
            AbuseError::RateExceeded { retry_after } => GuardError::RateExceeded { retry_after },
            AbuseError::InvalidConfig(msg) => GuardError::Config(msg),
        }
    }
}

impl From<CoreError> for GuardError {
    fn from(e: CoreError) -> Self {
        GuardError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(e: serde_json::Error) -> Self {
        GuardError::Config(e.to_string())
    }
}

impl From<tokio::task::JoinError> for GuardError {
    fn from(e: tokio::task::JoinError) -> Self {
        GuardError::TaskJoin(e.to_string())
    }
}

/// Result type for security layer operations.
pub type Result<T> = std::result::Result<T, GuardError>;
