//! Error types for identifier handling.

use thiserror::Error;

/// Errors that can occur while constructing or decoding identifiers.
#[derive(Error, Debug)]
pub enum EncryptionError {
    /// Invalid public key length.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length.
        expected: usize,
        /// Actual key length.
        actual: usize,
    },

    /// Invalid nonce length.
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected nonce length.
        expected: usize,
        /// Actual nonce length.
        actual: usize,
    },

    /// Invalid hash length.
    #[error("Invalid hash length: expected {expected}, got {actual}")]
    InvalidHashLength {
        /// Expected hash length.
        expected: usize,
        /// Actual hash length.
        actual: usize,
    },

    /// Input was not valid standard padded base64.
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),
}

/// Result type for identifier operations.
pub type Result<T> = std::result::Result<T, EncryptionError>;
