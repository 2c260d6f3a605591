//! Error types for the key cache.

use posto_guard_core::UserId;
use thiserror::Error;

/// Errors that can occur when reading the key cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// No key is cached for the user in this process.
    ///
    /// Expected after a restart or a logout; callers force re-authentication.
    #[error("no encryption key cached for user {0}")]
    KeyUnavailable(UserId),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
