//! Error types for payload handling.

use thiserror::Error;

/// Errors that can occur while building, encoding or projecting payloads.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Payload bytes could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Structural validation failed.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The requested recipient is not present on the payload.
    #[error("Recipient {0} is not a recipient of this payload")]
    RecipientUnknown(String),

    /// The privacy flag on the wire is not a known mode.
    #[error("Unknown privacy flag: {0}")]
    UnknownPrivacyFlag(u8),
}

/// Result type for payload operations.
pub type Result<T> = std::result::Result<T, PayloadError>;
