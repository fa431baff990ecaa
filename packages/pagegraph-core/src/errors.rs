//! Error types for pagegraph-core
//!
//! One vocabulary for the whole core; each layer translates store-level
//! errors into it exactly once at its boundary. Transport codes live in
//! the server crate, not here.

use thiserror::Error;

use crate::ports::StoreError;

/// Main error type for core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input, reserved key present, empty required field,
    /// type mismatch on a structural path
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing page or missing key on a structural path
    #[error("not found: {0}")]
    NotFound(String),

    /// Sequence index outside bounds
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Store failure other than "does not exist"
    #[error("store error: {0}")]
    Store(String),

    /// Frontmatter (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Template parse failure or expansion deadline expiry
    #[error("template error: {0}")]
    Template(String),

    /// A required collaborator is not wired
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Deadline expiry outside template supervision
    #[error("timeout: {0}")]
    Timeout(String),
}

impl CoreError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        CoreError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        CoreError::OutOfRange(msg.into())
    }

    pub fn serialization<E: std::fmt::Display>(e: E) -> Self {
        CoreError::Serialization(e.to_string())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        CoreError::Unavailable(msg.into())
    }

    /// True when the error is the store's "does not exist" signal,
    /// surfaced for callers that treat missing pages as soft failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotExist(page) => CoreError::NotFound(format!("page '{}' not found", page)),
            StoreError::Other(msg) => CoreError::Store(msg),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
