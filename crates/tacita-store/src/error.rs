//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur in a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying database failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored record could not be decoded.
    #[error("Corrupt record: {0}")]
    Corruption(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
