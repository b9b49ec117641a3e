//! The encoded payload wire unit and its codec.
//!
//! Encoding uses bincode over the serde shape of the payload, which is
//! byte-stable for a given value: the manager relies on this when it
//! re-encodes a sanitized payload and when it derives the transaction
//! hash from the ciphertext alone.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tacita_encryption::{MessageHash, Nonce, PublicKey};

use crate::{PayloadError, PrivacyMode, Result};

/// The security hash binding a payload to one affected transaction.
///
/// Opaque bytes to this crate; the enclave computes and verifies them.
pub type SecurityHash = Vec<u8>;

/// The on-wire and at-rest unit of a private transaction.
///
/// A payload carries the ciphertext, one sealed master-key box per
/// recipient, and the privacy metadata binding the transaction to prior
/// affected transactions. Payloads are immutable; projection and
/// re-labelling return new values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPayload {
    /// The key the payload was encrypted by.
    sender_key: PublicKey,

    /// The encrypted transaction data. Its hash addresses the record.
    cipher_text: Vec<u8>,

    /// Nonce used to seal the ciphertext.
    cipher_text_nonce: Nonce,

    /// One sealed master key per recipient, positionally matched with
    /// `recipient_keys`.
    recipient_boxes: Vec<Vec<u8>>,

    /// Nonce shared by all recipient boxes.
    recipient_nonce: Nonce,

    /// Recipient identities. Empty on a payload received by a
    /// non-originating node, which only knows its own box.
    recipient_keys: Vec<PublicKey>,

    /// The privacy policy fixed at encryption time.
    privacy_mode: PrivacyMode,

    /// Security hashes for the affected transactions, in the order the
    /// sender supplied them.
    affected_contract_transactions: Vec<(MessageHash, SecurityHash)>,

    /// Execution hash; non-empty only under private state validation.
    exec_hash: Vec<u8>,
}

impl EncodedPayload {
    /// Get the sender key.
    pub fn sender_key(&self) -> &PublicKey {
        &self.sender_key
    }

    /// Get the ciphertext.
    pub fn cipher_text(&self) -> &[u8] {
        &self.cipher_text
    }

    /// Get the ciphertext nonce.
    pub fn cipher_text_nonce(&self) -> &Nonce {
        &self.cipher_text_nonce
    }

    /// Get the recipient boxes.
    pub fn recipient_boxes(&self) -> &[Vec<u8>] {
        &self.recipient_boxes
    }

    /// Get the recipient nonce.
    pub fn recipient_nonce(&self) -> &Nonce {
        &self.recipient_nonce
    }

    /// Get the recipient keys.
    pub fn recipient_keys(&self) -> &[PublicKey] {
        &self.recipient_keys
    }

    /// Get the privacy mode.
    pub fn privacy_mode(&self) -> PrivacyMode {
        self.privacy_mode
    }

    /// Get the affected contract transactions in sender-supplied order.
    pub fn affected_contract_transactions(&self) -> &[(MessageHash, SecurityHash)] {
        &self.affected_contract_transactions
    }

    /// Get the hashes of the affected contract transactions.
    pub fn affected_hashes(&self) -> Vec<MessageHash> {
        self.affected_contract_transactions
            .iter()
            .map(|(hash, _)| hash.clone())
            .collect()
    }

    /// Get the execution hash.
    pub fn exec_hash(&self) -> &[u8] {
        &self.exec_hash
    }

    /// Derive the transaction hash addressing this payload.
    pub fn transaction_hash(&self) -> MessageHash {
        MessageHash::from_cipher_text(&self.cipher_text)
    }

    /// Validate the structural invariants.
    ///
    /// Checks:
    /// - at least one recipient box
    /// - recipient keys, when present, match the boxes positionally
    /// - the execution hash is non-empty exactly under private state
    ///   validation
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::InvalidPayload` naming the violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.recipient_boxes.is_empty() {
            return Err(PayloadError::InvalidPayload(
                "payload has no recipient boxes".to_string(),
            ));
        }

        if !self.recipient_keys.is_empty()
            && self.recipient_keys.len() != self.recipient_boxes.len()
        {
            return Err(PayloadError::InvalidPayload(format!(
                "{} recipient keys for {} boxes",
                self.recipient_keys.len(),
                self.recipient_boxes.len()
            )));
        }

        match self.privacy_mode {
            PrivacyMode::PrivateStateValidation => {
                if self.exec_hash.is_empty() {
                    return Err(PayloadError::InvalidPayload(
                        "private state validation requires an execution hash".to_string(),
                    ));
                }
            }
            PrivacyMode::StandardPrivate => {
                if !self.exec_hash.is_empty() {
                    return Err(PayloadError::InvalidPayload(
                        "execution hash present outside private state validation".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Serialize the payload to bytes.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::Serialization` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PayloadError::Serialization(e.to_string()))
    }

    /// Deserialize and validate a payload from bytes.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::Serialization` if deserialization fails, or
    /// `PayloadError::InvalidPayload` if validation fails.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let payload: Self =
            bincode::deserialize(bytes).map_err(|e| PayloadError::Serialization(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Project this payload for a single recipient.
    ///
    /// The projection keeps only the box belonging to `recipient`, so a
    /// peer learns nothing about the other participants' boxes. The
    /// recipient key list collapses to `[recipient]`.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::RecipientUnknown` if `recipient` is not in
    /// the recipient key list.
    pub fn for_recipient(&self, recipient: &PublicKey) -> Result<EncodedPayload> {
        let index = self
            .recipient_keys
            .iter()
            .position(|k| k == recipient)
            .ok_or_else(|| PayloadError::RecipientUnknown(recipient.encode_to_base64()))?;

        Ok(EncodedPayload {
            recipient_boxes: vec![self.recipient_boxes[index].clone()],
            recipient_keys: vec![recipient.clone()],
            ..self.clone()
        })
    }

    /// Return a copy with `recipient` appended to the recipient keys.
    ///
    /// Used to re-label a payload whose recipient list was dropped on
    /// receipt, once decryption has revealed which key its single box
    /// belongs to. Boxes are unchanged.
    pub fn with_recipient(&self, recipient: PublicKey) -> EncodedPayload {
        let mut recipient_keys = self.recipient_keys.clone();
        recipient_keys.push(recipient);
        EncodedPayload {
            recipient_keys,
            ..self.clone()
        }
    }

    /// Return a copy with a recipient key and its box appended.
    ///
    /// Used when merging two views of the same transaction, where the
    /// incoming view carries a box the stored one is missing.
    pub fn with_recipient_box(&self, recipient: PublicKey, boxed: Vec<u8>) -> EncodedPayload {
        let mut recipient_keys = self.recipient_keys.clone();
        let mut recipient_boxes = self.recipient_boxes.clone();
        recipient_keys.push(recipient);
        recipient_boxes.push(boxed);
        EncodedPayload {
            recipient_keys,
            recipient_boxes,
            ..self.clone()
        }
    }

    /// Return a copy with the given affected transaction entries removed.
    ///
    /// The relative order of the surviving entries is preserved.
    pub fn without_affected(&self, invalid: &BTreeSet<MessageHash>) -> EncodedPayload {
        let affected_contract_transactions = self
            .affected_contract_transactions
            .iter()
            .filter(|(hash, _)| !invalid.contains(hash))
            .cloned()
            .collect();
        EncodedPayload {
            affected_contract_transactions,
            ..self.clone()
        }
    }
}

/// Builder for constructing encoded payloads.
#[derive(Default)]
pub struct EncodedPayloadBuilder {
    sender_key: Option<PublicKey>,
    cipher_text: Option<Vec<u8>>,
    cipher_text_nonce: Option<Nonce>,
    recipient_boxes: Vec<Vec<u8>>,
    recipient_nonce: Option<Nonce>,
    recipient_keys: Vec<PublicKey>,
    privacy_mode: Option<PrivacyMode>,
    affected_contract_transactions: Vec<(MessageHash, SecurityHash)>,
    exec_hash: Vec<u8>,
}

impl EncodedPayloadBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender key.
    pub fn sender_key(mut self, key: PublicKey) -> Self {
        self.sender_key = Some(key);
        self
    }

    /// Set the ciphertext.
    pub fn cipher_text(mut self, cipher_text: Vec<u8>) -> Self {
        self.cipher_text = Some(cipher_text);
        self
    }

    /// Set the ciphertext nonce.
    pub fn cipher_text_nonce(mut self, nonce: Nonce) -> Self {
        self.cipher_text_nonce = Some(nonce);
        self
    }

    /// Set the recipient boxes.
    pub fn recipient_boxes(mut self, boxes: Vec<Vec<u8>>) -> Self {
        self.recipient_boxes = boxes;
        self
    }

    /// Set the recipient nonce.
    pub fn recipient_nonce(mut self, nonce: Nonce) -> Self {
        self.recipient_nonce = Some(nonce);
        self
    }

    /// Set the recipient keys.
    pub fn recipient_keys(mut self, keys: Vec<PublicKey>) -> Self {
        self.recipient_keys = keys;
        self
    }

    /// Set the privacy mode (defaults to standard private).
    pub fn privacy_mode(mut self, mode: PrivacyMode) -> Self {
        self.privacy_mode = Some(mode);
        self
    }

    /// Set the affected contract transaction entries.
    pub fn affected_contract_transactions(
        mut self,
        affected: Vec<(MessageHash, SecurityHash)>,
    ) -> Self {
        self.affected_contract_transactions = affected;
        self
    }

    /// Set the execution hash.
    pub fn exec_hash(mut self, exec_hash: Vec<u8>) -> Self {
        self.exec_hash = exec_hash;
        self
    }

    /// Build and validate the payload.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::InvalidPayload` if a required field is
    /// missing or a structural invariant is violated.
    pub fn build(self) -> Result<EncodedPayload> {
        let sender_key = self
            .sender_key
            .ok_or_else(|| PayloadError::InvalidPayload("missing sender_key".to_string()))?;
        let cipher_text = self
            .cipher_text
            .ok_or_else(|| PayloadError::InvalidPayload("missing cipher_text".to_string()))?;
        let cipher_text_nonce = self.cipher_text_nonce.ok_or_else(|| {
            PayloadError::InvalidPayload("missing cipher_text_nonce".to_string())
        })?;
        let recipient_nonce = self
            .recipient_nonce
            .ok_or_else(|| PayloadError::InvalidPayload("missing recipient_nonce".to_string()))?;

        let payload = EncodedPayload {
            sender_key,
            cipher_text,
            cipher_text_nonce,
            recipient_boxes: self.recipient_boxes,
            recipient_nonce,
            recipient_keys: self.recipient_keys,
            privacy_mode: self.privacy_mode.unwrap_or(PrivacyMode::StandardPrivate),
            affected_contract_transactions: self.affected_contract_transactions,
            exec_hash: self.exec_hash,
        };
        payload.validate()?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> PublicKey {
        PublicKey::from_bytes(&[seed; 32]).unwrap()
    }

    fn test_payload() -> EncodedPayload {
        EncodedPayloadBuilder::new()
            .sender_key(key(1))
            .cipher_text(b"cipher".to_vec())
            .cipher_text_nonce(Nonce::from_bytes(&[2u8; 24]).unwrap())
            .recipient_boxes(vec![b"box-a".to_vec(), b"box-b".to_vec()])
            .recipient_nonce(Nonce::from_bytes(&[3u8; 24]).unwrap())
            .recipient_keys(vec![key(10), key(11)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let payload = test_payload();
        let bytes = payload.to_bytes().unwrap();
        let restored = EncodedPayload::from_bytes(&bytes).unwrap();
        assert_eq!(payload, restored);
    }

    #[test]
    fn test_encoding_is_byte_stable() {
        let payload = test_payload();
        assert_eq!(payload.to_bytes().unwrap(), payload.to_bytes().unwrap());
    }

    #[test]
    fn test_build_requires_boxes() {
        let result = EncodedPayloadBuilder::new()
            .sender_key(key(1))
            .cipher_text(b"cipher".to_vec())
            .cipher_text_nonce(Nonce::from_bytes(&[2u8; 24]).unwrap())
            .recipient_nonce(Nonce::from_bytes(&[3u8; 24]).unwrap())
            .build();
        assert!(matches!(result, Err(PayloadError::InvalidPayload(_))));
    }

    #[test]
    fn test_build_rejects_key_box_mismatch() {
        let result = EncodedPayloadBuilder::new()
            .sender_key(key(1))
            .cipher_text(b"cipher".to_vec())
            .cipher_text_nonce(Nonce::from_bytes(&[2u8; 24]).unwrap())
            .recipient_boxes(vec![b"box".to_vec()])
            .recipient_nonce(Nonce::from_bytes(&[3u8; 24]).unwrap())
            .recipient_keys(vec![key(10), key(11)])
            .build();
        assert!(matches!(result, Err(PayloadError::InvalidPayload(_))));
    }

    #[test]
    fn test_empty_recipient_keys_is_valid() {
        let payload = EncodedPayloadBuilder::new()
            .sender_key(key(1))
            .cipher_text(b"cipher".to_vec())
            .cipher_text_nonce(Nonce::from_bytes(&[2u8; 24]).unwrap())
            .recipient_boxes(vec![b"box".to_vec()])
            .recipient_nonce(Nonce::from_bytes(&[3u8; 24]).unwrap())
            .build()
            .unwrap();
        assert!(payload.recipient_keys().is_empty());
    }

    #[test]
    fn test_psv_requires_exec_hash() {
        let result = EncodedPayloadBuilder::new()
            .sender_key(key(1))
            .cipher_text(b"cipher".to_vec())
            .cipher_text_nonce(Nonce::from_bytes(&[2u8; 24]).unwrap())
            .recipient_boxes(vec![b"box".to_vec()])
            .recipient_nonce(Nonce::from_bytes(&[3u8; 24]).unwrap())
            .privacy_mode(PrivacyMode::PrivateStateValidation)
            .build();
        assert!(matches!(result, Err(PayloadError::InvalidPayload(_))));
    }

    #[test]
    fn test_standard_private_rejects_exec_hash() {
        let result = EncodedPayloadBuilder::new()
            .sender_key(key(1))
            .cipher_text(b"cipher".to_vec())
            .cipher_text_nonce(Nonce::from_bytes(&[2u8; 24]).unwrap())
            .recipient_boxes(vec![b"box".to_vec()])
            .recipient_nonce(Nonce::from_bytes(&[3u8; 24]).unwrap())
            .exec_hash(b"exec".to_vec())
            .build();
        assert!(matches!(result, Err(PayloadError::InvalidPayload(_))));
    }

    #[test]
    fn test_for_recipient_keeps_only_matching_box() {
        let payload = test_payload();
        let projected = payload.for_recipient(&key(11)).unwrap();

        assert_eq!(projected.recipient_boxes(), &[b"box-b".to_vec()]);
        assert_eq!(projected.recipient_keys(), &[key(11)]);
        assert_eq!(projected.cipher_text(), payload.cipher_text());
        assert_eq!(projected.sender_key(), payload.sender_key());
    }

    #[test]
    fn test_for_recipient_unknown_key() {
        let payload = test_payload();
        let result = payload.for_recipient(&key(99));
        assert!(matches!(result, Err(PayloadError::RecipientUnknown(_))));
    }

    #[test]
    fn test_with_recipient_appends_key() {
        let payload = EncodedPayloadBuilder::new()
            .sender_key(key(1))
            .cipher_text(b"cipher".to_vec())
            .cipher_text_nonce(Nonce::from_bytes(&[2u8; 24]).unwrap())
            .recipient_boxes(vec![b"box".to_vec()])
            .recipient_nonce(Nonce::from_bytes(&[3u8; 24]).unwrap())
            .build()
            .unwrap();

        let labelled = payload.with_recipient(key(7));
        assert_eq!(labelled.recipient_keys(), &[key(7)]);
        assert_eq!(labelled.recipient_boxes(), payload.recipient_boxes());
    }

    #[test]
    fn test_with_recipient_box_appends_pair() {
        let payload = test_payload();
        let merged = payload.with_recipient_box(key(12), b"box-c".to_vec());
        assert_eq!(merged.recipient_keys(), &[key(10), key(11), key(12)]);
        assert_eq!(
            merged.recipient_boxes(),
            &[b"box-a".to_vec(), b"box-b".to_vec(), b"box-c".to_vec()]
        );
    }

    #[test]
    fn test_without_affected_preserves_order() {
        let h1 = MessageHash::from_cipher_text(b"t1");
        let h2 = MessageHash::from_cipher_text(b"t2");
        let h3 = MessageHash::from_cipher_text(b"t3");
        let payload = EncodedPayloadBuilder::new()
            .sender_key(key(1))
            .cipher_text(b"cipher".to_vec())
            .cipher_text_nonce(Nonce::from_bytes(&[2u8; 24]).unwrap())
            .recipient_boxes(vec![b"box".to_vec()])
            .recipient_nonce(Nonce::from_bytes(&[3u8; 24]).unwrap())
            .affected_contract_transactions(vec![
                (h1.clone(), b"s1".to_vec()),
                (h2.clone(), b"s2".to_vec()),
                (h3.clone(), b"s3".to_vec()),
            ])
            .build()
            .unwrap();

        let invalid = BTreeSet::from([h2]);
        let sanitized = payload.without_affected(&invalid);
        assert_eq!(sanitized.affected_hashes(), vec![h1, h3]);
    }

    #[test]
    fn test_transaction_hash_matches_cipher_text() {
        let payload = test_payload();
        assert_eq!(
            payload.transaction_hash(),
            MessageHash::from_cipher_text(payload.cipher_text())
        );
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(EncodedPayload::from_bytes(&[0xFF; 40]).is_err());
    }
}
