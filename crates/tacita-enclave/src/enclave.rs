//! The enclave contract and the raw transaction form.

use std::collections::BTreeSet;

use tacita_encryption::{MessageHash, Nonce, PublicKey};
use tacita_payload::{AffectedTransaction, EncodedPayload, PrivacyMode};

use crate::Result;

/// A sender's pre-distribution transaction, created ahead of a signed send.
///
/// The payload is already sealed under a master key; the master key itself
/// is sealed to the sender, so only the originating node can later turn
/// the raw record into a distributable payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTransaction {
    encrypted_payload: Vec<u8>,
    encrypted_key: Vec<u8>,
    nonce: Nonce,
    from: PublicKey,
}

impl RawTransaction {
    /// Create a raw transaction.
    pub fn new(
        encrypted_payload: Vec<u8>,
        encrypted_key: Vec<u8>,
        nonce: Nonce,
        from: PublicKey,
    ) -> Self {
        Self {
            encrypted_payload,
            encrypted_key,
            nonce,
            from,
        }
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
    pub fn from(&self) -> &PublicKey {
        &self.from
    }
}

/// The key custody boundary.
///
/// Implementations hold private key material and perform every
/// cryptographic operation the transaction manager needs. All methods are
/// synchronous; implementations must be thread-safe and stateless with
/// respect to transaction identity.
pub trait Enclave: Send + Sync {
    /// The node's default sending key.
    fn default_public_key(&self) -> PublicKey;

    /// Keys this node holds private material for, in stable construction
    /// order. Callers iterating for trial decryption rely on the order
    /// being deterministic.
    fn public_keys(&self) -> Vec<PublicKey>;

    /// Keys always added as implicit recipients of outbound transactions.
    fn forwarding_keys(&self) -> Vec<PublicKey>;

    /// Seal a plaintext for a recipient set.
    ///
    /// Produces a payload with a fresh master key, one box per recipient,
    /// and security hashes recomputed for each resolved affected
    /// transaction.
    ///
    /// # Errors
    ///
    /// Fails if the enclave does not hold the sender's private key or if
    /// sealing fails.
    fn encrypt_payload(
        &self,
        plain_text: &[u8],
        sender: &PublicKey,
        recipients: &[PublicKey],
        privacy_mode: PrivacyMode,
        affected: &[AffectedTransaction],
        exec_hash: &[u8],
    ) -> Result<EncodedPayload>;

    /// Seal an existing raw transaction for a recipient set.
    ///
    /// Recovers the master key from the raw record and re-uses its
    /// ciphertext, so the resulting payload hashes to the same transaction
    /// hash as the raw record.
    ///
    /// # Errors
    ///
    /// Fails if the enclave does not hold the raw sender's private key or
    /// if the sealed master key cannot be opened.
    fn encrypt_from_raw(
        &self,
        raw: &RawTransaction,
        recipients: &[PublicKey],
        privacy_mode: PrivacyMode,
        affected: &[AffectedTransaction],
        exec_hash: &[u8],
    ) -> Result<EncodedPayload>;

    /// Seal a plaintext into a raw transaction addressed only to its
    /// sender.
    fn encrypt_raw_payload(&self, plain_text: &[u8], sender: &PublicKey)
        -> Result<RawTransaction>;

    /// Open a payload with a local key.
    ///
    /// When `recipient` is the payload's sender, the first recipient key
    /// is used as the Diffie-Hellman counterparty; otherwise the box at
    /// the recipient's position is opened against the sender key.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::EnclaveError::Decryption`] when the key cannot
    /// open the payload; callers performing key search treat any error as
    /// "wrong key, try the next".
    fn unencrypt_transaction(
        &self,
        payload: &EncodedPayload,
        recipient: &PublicKey,
    ) -> Result<Vec<u8>>;

    /// Open a raw transaction as its sender.
    fn unencrypt_raw_payload(&self, raw: &RawTransaction) -> Result<Vec<u8>>;

    /// Find the affected-transaction entries whose stored security hash
    /// disagrees with what this enclave recomputes.
    ///
    /// Entries referencing a hash with no resolved affected payload are
    /// reported invalid: an unverifiable binding is no binding.
    fn find_invalid_security_hashes(
        &self,
        payload: &EncodedPayload,
        affected: &[AffectedTransaction],
    ) -> BTreeSet<MessageHash>;
}
