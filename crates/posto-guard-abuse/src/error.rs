//! Error types for abuse defense.

use std::time::Duration;

use thiserror::Error;

/// Rejections and configuration errors from the abuse layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbuseError {
    /// The client is serving an active block.
    #[error("client is blocked; retry after {}s", .retry_after.as_secs())]
    Blocked { retry_after: Duration },

    /// This request exceeded the client's quota and started a block.
    #[error("rate limit exceeded; retry after {}s", .retry_after.as_secs())]
    RateExceeded { retry_after: Duration },

    /// Unusable configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AbuseError {
    /// The retry-after hint carried by a rejection.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AbuseError::Blocked { retry_after } | AbuseError::RateExceeded { retry_after } => {
                Some(*retry_after)
            }
            AbuseError::InvalidConfig(_) => None,
        }
    }
}

/// Result type for abuse defense operations.
pub type Result<T> = std::result::Result<T, AbuseError>;
