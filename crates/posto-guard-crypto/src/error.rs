//! Error types for key derivation and content encryption.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Malformed input rejected before any cryptographic work.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// KDF cost parameters or bounds that cannot be used.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Encryption error.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication failure or malformed envelope.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
