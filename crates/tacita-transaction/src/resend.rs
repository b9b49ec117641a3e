//! Resend requests and the own-message resend manager.
//!
//! Two concerns meet here. [`ResendRequest`] models what a peer may ask
//! of us: replay everything involving one key, or hand back a single
//! record. [`ResendManagerImpl`] handles the mirror image: a payload we
//! originated coming back to us during a peer's catch-up, which must be
//! merged with whatever record we already hold rather than overwrite it.

use std::sync::Arc;

use tracing::debug;

use tacita_enclave::Enclave;
use tacita_encryption::{MessageHash, PublicKey};
use tacita_payload::EncodedPayload;
use tacita_store::{EncryptedTransaction, TransactionStore};

use crate::{Result, TransactionError};

/// A peer's request to have transactions resent.
#[derive(Clone, Debug)]
pub enum ResendRequest {
    /// Replay every stored transaction the key participates in, publishing
    /// each projection to the key's node.
    All {
        /// The key whose transactions are replayed.
        recipient: PublicKey,
    },

    /// Return a single transaction synchronously, without publishing.
    Individual {
        /// The key the payload is projected for.
        recipient: PublicKey,
        /// The transaction to return.
        hash: MessageHash,
    },
}

/// The outcome of a resend request.
///
/// Carries payload bytes only for [`ResendRequest::Individual`]; a full
/// replay distributes through the publisher instead.
#[derive(Clone, Debug, Default)]
pub struct ResendResponse {
    payload: Option<Vec<u8>>,
}

impl ResendResponse {
    /// A response with no inline payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A response carrying encoded payload bytes.
    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
        }
    }

    /// The encoded payload, if the request produced one.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}

/// Accepts payloads this node originated when they arrive back from a
/// peer.
pub trait ResendManager: Send + Sync {
    /// Merge an incoming copy of an own message into the store.
    ///
    /// # Errors
    ///
    /// Fails if the bytes do not decode, if the payload was not sent by a
    /// locally held key, or if the store rejects the write.
    fn accept_own_message(&self, data: &[u8]) -> Result<()>;
}

/// Store-backed resend manager.
///
/// A node that lost records re-learns them through peers resending the
/// payloads it once published. Each incoming copy carries the recipient
/// boxes the resending peer knew about; the union of all copies restores
/// the full recipient list.
pub struct ResendManagerImpl {
    enclave: Arc<dyn Enclave>,
    transaction_store: Arc<dyn TransactionStore>,
}

impl ResendManagerImpl {
    /// Create a resend manager over the given collaborators.
    pub fn new(enclave: Arc<dyn Enclave>, transaction_store: Arc<dyn TransactionStore>) -> Self {
        Self {
            enclave,
            transaction_store,
        }
    }

    fn merge(existing: &EncodedPayload, incoming: &EncodedPayload) -> (EncodedPayload, bool) {
        // A record stored without its key labels cannot be merged by key;
        // the incoming copy is at least as informative.
        if existing.recipient_keys().is_empty() {
            return (incoming.clone(), existing != incoming);
        }

        let mut merged = existing.clone();
        let mut changed = false;
        for (key, boxed) in incoming
            .recipient_keys()
            .iter()
            .zip(incoming.recipient_boxes())
        {
            if !merged.recipient_keys().contains(key) {
                merged = merged.with_recipient_box(key.clone(), boxed.clone());
                changed = true;
            }
        }
        (merged, changed)
    }
}

impl ResendManager for ResendManagerImpl {
    fn accept_own_message(&self, data: &[u8]) -> Result<()> {
        let payload = EncodedPayload::from_bytes(data)?;
        let transaction_hash = payload.transaction_hash();

        let sender = payload.sender_key().clone();
        if !self.enclave.public_keys().contains(&sender) {
            return Err(TransactionError::PrivacyViolation(format!(
                "Message {} was not originated by this node",
                transaction_hash
            )));
        }

        // Opening the payload proves the copy is genuine before it can
        // touch the stored record.
        self.enclave.unencrypt_transaction(&payload, &sender)?;

        match self.transaction_store.retrieve_by_hash(&transaction_hash)? {
            Some(existing) => {
                let existing_payload = EncodedPayload::from_bytes(existing.encoded_payload())?;
                let (merged, changed) = Self::merge(&existing_payload, &payload);
                if changed {
                    debug!(
                        hash = %transaction_hash,
                        "Merged additional recipients into stored transaction"
                    );
                    self.transaction_store.save(&EncryptedTransaction::new(
                        transaction_hash,
                        merged.to_bytes()?,
                    ))?;
                }
            }
            None => {
                self.transaction_store
                    .save(&EncryptedTransaction::new(transaction_hash, data.to_vec()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacita_enclave::MemoryEnclave;
    use tacita_payload::PrivacyMode;
    use tacita_store::MemoryTransactionStore;

    fn setup() -> (Arc<MemoryEnclave>, Arc<MemoryTransactionStore>, ResendManagerImpl) {
        let enclave = Arc::new(MemoryEnclave::from_private_keys(&[[1u8; 32]]));
        let store = Arc::new(MemoryTransactionStore::new());
        let manager = ResendManagerImpl::new(enclave.clone(), store.clone());
        (enclave, store, manager)
    }

    fn own_payload(enclave: &MemoryEnclave, recipients: &[PublicKey]) -> EncodedPayload {
        enclave
            .encrypt_payload(
                b"own message",
                &enclave.default_public_key(),
                recipients,
                PrivacyMode::StandardPrivate,
                &[],
                &[],
            )
            .unwrap()
    }

    fn foreign_key(seed: u8) -> PublicKey {
        MemoryEnclave::from_private_keys(&[[seed; 32]]).default_public_key()
    }

    #[test]
    fn test_unknown_record_is_saved() {
        let (enclave, store, manager) = setup();
        let payload = own_payload(&enclave, &[enclave.default_public_key(), foreign_key(2)]);
        let bytes = payload.to_bytes().unwrap();

        manager.accept_own_message(&bytes).unwrap();

        let stored = store
            .retrieve_by_hash(&payload.transaction_hash())
            .unwrap()
            .unwrap();
        assert_eq!(stored.encoded_payload(), bytes.as_slice());
    }

    #[test]
    fn test_partial_record_gains_recipients() {
        let (enclave, store, manager) = setup();
        let our_key = enclave.default_public_key();
        let other = foreign_key(2);
        let full = own_payload(&enclave, &[our_key.clone(), other.clone()]);
        let hash = full.transaction_hash();

        // Store only our own projection, as left behind by a partial
        // recovery.
        let partial = full.for_recipient(&our_key).unwrap();
        store
            .save(&EncryptedTransaction::new(
                hash.clone(),
                partial.to_bytes().unwrap(),
            ))
            .unwrap();

        manager
            .accept_own_message(&full.to_bytes().unwrap())
            .unwrap();

        let merged =
            EncodedPayload::from_bytes(store.retrieve_by_hash(&hash).unwrap().unwrap().encoded_payload())
                .unwrap();
        assert!(merged.recipient_keys().contains(&our_key));
        assert!(merged.recipient_keys().contains(&other));
        assert_eq!(merged.recipient_keys().len(), merged.recipient_boxes().len());
    }

    #[test]
    fn test_redelivery_is_idempotent() {
        let (enclave, store, manager) = setup();
        let payload = own_payload(&enclave, &[enclave.default_public_key()]);
        let bytes = payload.to_bytes().unwrap();

        manager.accept_own_message(&bytes).unwrap();
        let first = store
            .retrieve_by_hash(&payload.transaction_hash())
            .unwrap()
            .unwrap();

        manager.accept_own_message(&bytes).unwrap();
        let second = store
            .retrieve_by_hash(&payload.transaction_hash())
            .unwrap()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_foreign_sender_rejected() {
        let (_enclave, _store, manager) = setup();
        let other_enclave = MemoryEnclave::from_private_keys(&[[7u8; 32]]);
        let foreign = own_payload(&other_enclave, &[other_enclave.default_public_key()]);

        let result = manager.accept_own_message(&foreign.to_bytes().unwrap());
        assert!(matches!(
            result,
            Err(TransactionError::PrivacyViolation(_))
        ));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let (_enclave, _store, manager) = setup();
        assert!(manager.accept_own_message(&[0xFF; 16]).is_err());
    }
}
