//! Error types for transaction mediation.

use tacita_encryption::MessageHash;
use thiserror::Error;

/// Errors surfaced by the transaction manager.
///
/// Validation and not-found errors surface to the caller; publish errors
/// never do (they are logged where they occur).
#[derive(Error, Debug)]
pub enum TransactionError {
    /// A required record is absent from the store.
    #[error("Message with hash {0} was not found")]
    TransactionNotFound(MessageHash),

    /// A privacy invariant was violated. Terminal for the request.
    #[error("Privacy violation: {0}")]
    PrivacyViolation(String),

    /// No local key can decrypt the payload.
    #[error("No suitable recipient keys found to decrypt payload for {0}")]
    RecipientKeyNotFound(MessageHash),

    /// The enclave rejected an operation.
    #[error("Enclave error: {0}")]
    Enclave(#[from] tacita_enclave::EnclaveError),

    /// A payload could not be decoded or built.
    #[error("Payload error: {0}")]
    Payload(#[from] tacita_payload::PayloadError),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] tacita_store::StoreError),
}

/// Result type for transaction operations.
pub type Result<T> = std::result::Result<T, TransactionError>;
