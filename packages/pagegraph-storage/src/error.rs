//! Error types for pagegraph-storage

use thiserror::Error;

/// Adapter construction and maintenance errors. Errors on the port
/// surfaces themselves use the core vocabulary (`StoreError`,
/// `CoreError`); this type covers what happens before a port exists,
/// like opening directories and building indexes.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index error: {0}")]
    Index(String),
}

impl StorageError {
    pub fn index<E: std::fmt::Display>(e: E) -> Self {
        StorageError::Index(e.to_string())
    }
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
