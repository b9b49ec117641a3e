//! Error types for enclave operations.

use thiserror::Error;

/// Errors that can occur inside the enclave boundary.
#[derive(Error, Debug)]
pub enum EnclaveError {
    /// Sealing a payload or box failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Opening a payload or box failed (wrong key or tampered data).
    #[error("Decryption failed: invalid ciphertext or key")]
    Decryption,

    /// The enclave holds no private material for the requested key.
    #[error("Key {0} is not managed by this enclave")]
    KeyNotManaged(String),

    /// The payload carries no box at the position the key maps to.
    #[error("No recipient box available for the requested key")]
    RecipientBoxMissing,

    /// A payload produced by the enclave failed structural validation.
    #[error("Payload error: {0}")]
    Payload(#[from] tacita_payload::PayloadError),
}

/// Result type for enclave operations.
pub type Result<T> = std::result::Result<T, EnclaveError>;
