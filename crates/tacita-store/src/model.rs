//! Stored record types.

use serde::{Deserialize, Serialize};
use tacita_encryption::{MessageHash, Nonce, PublicKey};

/// A distributed transaction at rest: the encoded payload under its
/// content address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedTransaction {
    hash: MessageHash,
    encoded_payload: Vec<u8>,
}

impl EncryptedTransaction {
    /// Create a record.
    pub fn new(hash: MessageHash, encoded_payload: Vec<u8>) -> Self {
        Self {
            hash,
            encoded_payload,
        }
    }

    /// The content address.
    pub fn hash(&self) -> &MessageHash {
        &self.hash
    }

    /// The encoded payload bytes.
    pub fn encoded_payload(&self) -> &[u8] {
        &self.encoded_payload
    }
}

/// A sender's pre-distribution transaction at rest.
///
/// Created by a raw store request and read back when the sender later
/// issues a signed send. The record keeps the sealed master key and the
/// sender identity alongside the sealed payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRawTransaction {
    hash: MessageHash,
    encrypted_payload: Vec<u8>,
    encrypted_key: Vec<u8>,
    nonce: Nonce,
    sender: PublicKey,
}

impl EncryptedRawTransaction {
    /// Create a record.
    pub fn new(
        hash: MessageHash,
        encrypted_payload: Vec<u8>,
        encrypted_key: Vec<u8>,
        nonce: Nonce,
        sender: PublicKey,
    ) -> Self {
        Self {
            hash,
            encrypted_payload,
            encrypted_key,
            nonce,
            sender,
        }
    }

    /// The content address.
    pub fn hash(&self) -> &MessageHash {
        &self.hash
    }

    /// The sealed transaction data.
    pub fn encrypted_payload(&self) -> &[u8] {
        &self.encrypted_payload
    }

    /// The master key, sealed to the sender.
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    /// The nonce used for both seals.
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// The sender key.
    pub fn sender(&self) -> &PublicKey {
        &self.sender
    }
}
