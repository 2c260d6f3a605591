//! Error types for the core primitives.

use thiserror::Error;

/// Errors that can occur when constructing core values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A client identity was empty.
    #[error("client identity must not be empty")]
    EmptyClientId,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
