//! Resolved affected transactions.

use tacita_encryption::MessageHash;

use crate::EncodedPayload;

/// A prior transaction resolved from the store while validating a new one.
///
/// Carries the decoded payload so the validator can inspect its privacy
/// mode and recipient set without another store round-trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffectedTransaction {
    hash: MessageHash,
    payload: EncodedPayload,
}

impl AffectedTransaction {
    /// Create a resolved pair.
    pub fn new(hash: MessageHash, payload: EncodedPayload) -> Self {
        Self { hash, payload }
    }

    /// The hash the new transaction references.
    pub fn hash(&self) -> &MessageHash {
        &self.hash
    }

    /// The decoded payload of the affected transaction.
    pub fn payload(&self) -> &EncodedPayload {
        &self.payload
    }
}
