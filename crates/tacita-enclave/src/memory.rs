//! In-process enclave over X25519 static keys.
//!
//! Every payload is sealed under a fresh random master key with
//! XChaCha20-Poly1305. The master key is then sealed once per recipient
//! under a shared key derived from the sender/recipient Diffie-Hellman
//! secret with BLAKE3. Because the shared secret is symmetric, either side
//! of a pair can open the box: recipients open against the sender key, and
//! the sender re-opens its own payloads against the first recipient.
//!
//! Private scalars are zeroized on drop and never leave this module.

use std::collections::BTreeSet;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

use tacita_encryption::{MessageHash, Nonce, PublicKey};
use tacita_payload::{
    AffectedTransaction, EncodedPayload, EncodedPayloadBuilder, PrivacyMode, SecurityHash,
};

use crate::security::security_hash;
use crate::{Enclave, EnclaveError, RawTransaction, Result};

/// Context string for shared key derivation.
const SHARED_KEY_CONTEXT: &str = "tacita enclave shared key v1";

/// Size of a master key in bytes.
const MASTER_KEY_SIZE: usize = 32;

/// One managed key pair.
#[derive(Zeroize, ZeroizeOnDrop)]
struct KeyPair {
    #[zeroize(skip)]
    public: PublicKey,
    private: [u8; 32],
}

/// An enclave holding its key pairs in process memory.
///
/// The first key pair is the node's default sending key. Key order is
/// stable, so trial decryption over [`Enclave::public_keys`] is
/// deterministic.
pub struct MemoryEnclave {
    key_pairs: Vec<KeyPair>,
    forwarding_keys: Vec<PublicKey>,
}

impl std::fmt::Debug for MemoryEnclave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEnclave")
            .field("keys", &self.key_pairs.len())
            .field("forwarding_keys", &self.forwarding_keys.len())
            .finish()
    }
}

impl MemoryEnclave {
    /// Create an enclave with `key_count` freshly generated key pairs.
    ///
    /// # Panics
    ///
    /// Panics if `key_count` is zero; an enclave without keys cannot act.
    pub fn generate(key_count: usize) -> Self {
        assert!(key_count > 0, "enclave requires at least one key pair");
        let key_pairs = (0..key_count)
            .map(|_| {
                let secret = StaticSecret::random_from_rng(OsRng);
                Self::key_pair_from_secret(secret)
            })
            .collect();
        Self {
            key_pairs,
            forwarding_keys: Vec::new(),
        }
    }

    /// Create an enclave from explicit private scalars.
    ///
    /// Useful where key material is provisioned externally or tests need
    /// deterministic identities.
    ///
    /// # Panics
    ///
    /// Panics if `private_keys` is empty.
    pub fn from_private_keys(private_keys: &[[u8; 32]]) -> Self {
        assert!(
            !private_keys.is_empty(),
            "enclave requires at least one key pair"
        );
        let key_pairs = private_keys
            .iter()
            .map(|bytes| Self::key_pair_from_secret(StaticSecret::from(*bytes)))
            .collect();
        Self {
            key_pairs,
            forwarding_keys: Vec::new(),
        }
    }

    /// Set the forwarding keys added as implicit recipients.
    pub fn with_forwarding_keys(mut self, keys: Vec<PublicKey>) -> Self {
        self.forwarding_keys = keys;
        self
    }

    fn key_pair_from_secret(secret: StaticSecret) -> KeyPair {
        let public = x25519_dalek::PublicKey::from(&secret);
        KeyPair {
            public: PublicKey::from(public.to_bytes()),
            private: secret.to_bytes(),
        }
    }

    fn private_key_for(&self, public: &PublicKey) -> Result<&[u8; 32]> {
        self.key_pairs
            .iter()
            .find(|pair| &pair.public == public)
            .map(|pair| &pair.private)
            .ok_or_else(|| EnclaveError::KeyNotManaged(public.encode_to_base64()))
    }

    /// Derive the symmetric key shared between a held private key and a
    /// peer public key.
    fn shared_key(&self, private: &[u8; 32], peer: &PublicKey) -> [u8; 32] {
        let secret = StaticSecret::from(*private);
        let peer_public = x25519_dalek::PublicKey::from(peer.to_bytes());
        let shared = secret.diffie_hellman(&peer_public);
        blake3::derive_key(SHARED_KEY_CONTEXT, shared.as_bytes())
    }

    fn seal(key: &[u8; 32], nonce: &Nonce, plain_text: &[u8]) -> Result<Vec<u8>> {
        let cipher = XChaCha20Poly1305::new(key.into());
        cipher
            .encrypt(XNonce::from_slice(nonce.as_bytes()), plain_text)
            .map_err(|_| EnclaveError::Encryption("XChaCha20-Poly1305 seal failed".to_string()))
    }

    fn open(key: &[u8; 32], nonce: &Nonce, cipher_text: &[u8]) -> Result<Vec<u8>> {
        let cipher = XChaCha20Poly1305::new(key.into());
        cipher
            .decrypt(XNonce::from_slice(nonce.as_bytes()), cipher_text)
            .map_err(|_| EnclaveError::Decryption)
    }

    fn generate_master_key() -> [u8; MASTER_KEY_SIZE] {
        let mut key = [0u8; MASTER_KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        key
    }

    fn open_master_key(&self, key: &[u8; 32], nonce: &Nonce, boxed: &[u8]) -> Result<[u8; 32]> {
        let mut opened = Self::open(key, nonce, boxed)?;
        let master: [u8; MASTER_KEY_SIZE] = opened
            .as_slice()
            .try_into()
            .map_err(|_| EnclaveError::Decryption)?;
        opened.zeroize();
        Ok(master)
    }

    fn seal_for_recipients(
        &self,
        master_key: &[u8; 32],
        sender_private: &[u8; 32],
        recipients: &[PublicKey],
        recipient_nonce: &Nonce,
    ) -> Result<Vec<Vec<u8>>> {
        recipients
            .iter()
            .map(|recipient| {
                let mut shared = self.shared_key(sender_private, recipient);
                let boxed = Self::seal(&shared, recipient_nonce, master_key);
                shared.zeroize();
                boxed
            })
            .collect()
    }

    fn affected_entries(
        affected: &[AffectedTransaction],
        new_cipher_text: &[u8],
    ) -> Vec<(MessageHash, SecurityHash)> {
        affected
            .iter()
            .map(|a| {
                (
                    a.hash().clone(),
                    security_hash(a.hash(), a.payload().cipher_text(), new_cipher_text),
                )
            })
            .collect()
    }
}

impl Enclave for MemoryEnclave {
    fn default_public_key(&self) -> PublicKey {
        self.key_pairs[0].public.clone()
    }

    fn public_keys(&self) -> Vec<PublicKey> {
        self.key_pairs.iter().map(|p| p.public.clone()).collect()
    }

    fn forwarding_keys(&self) -> Vec<PublicKey> {
        self.forwarding_keys.clone()
    }

    fn encrypt_payload(
        &self,
        plain_text: &[u8],
        sender: &PublicKey,
        recipients: &[PublicKey],
        privacy_mode: PrivacyMode,
        affected: &[AffectedTransaction],
        exec_hash: &[u8],
    ) -> Result<EncodedPayload> {
        let sender_private = *self.private_key_for(sender)?;

        let mut master_key = Self::generate_master_key();
        let cipher_text_nonce = Nonce::generate();
        let cipher_text = Self::seal(&master_key, &cipher_text_nonce, plain_text)?;

        let recipient_nonce = Nonce::generate();
        let recipient_boxes =
            self.seal_for_recipients(&master_key, &sender_private, recipients, &recipient_nonce)?;
        master_key.zeroize();

        let affected_entries = Self::affected_entries(affected, &cipher_text);

        let payload = EncodedPayloadBuilder::new()
            .sender_key(sender.clone())
            .cipher_text(cipher_text)
            .cipher_text_nonce(cipher_text_nonce)
            .recipient_boxes(recipient_boxes)
            .recipient_nonce(recipient_nonce)
            .recipient_keys(recipients.to_vec())
            .privacy_mode(privacy_mode)
            .affected_contract_transactions(affected_entries)
            .exec_hash(exec_hash.to_vec())
            .build()?;
        Ok(payload)
    }

    fn encrypt_from_raw(
        &self,
        raw: &RawTransaction,
        recipients: &[PublicKey],
        privacy_mode: PrivacyMode,
        affected: &[AffectedTransaction],
        exec_hash: &[u8],
    ) -> Result<EncodedPayload> {
        let sender_private = *self.private_key_for(raw.from())?;

        // Recover the master key sealed to the sender; the ciphertext is
        // reused as-is so the transaction hash does not change.
        let mut self_shared = self.shared_key(&sender_private, raw.from());
        let mut master_key = self.open_master_key(&self_shared, raw.nonce(), raw.encrypted_key())?;
        self_shared.zeroize();

        let recipient_nonce = Nonce::generate();
        let recipient_boxes =
            self.seal_for_recipients(&master_key, &sender_private, recipients, &recipient_nonce)?;
        master_key.zeroize();

        let affected_entries = Self::affected_entries(affected, raw.encrypted_payload());

        let payload = EncodedPayloadBuilder::new()
            .sender_key(raw.from().clone())
            .cipher_text(raw.encrypted_payload().to_vec())
            .cipher_text_nonce(raw.nonce().clone())
            .recipient_boxes(recipient_boxes)
            .recipient_nonce(recipient_nonce)
            .recipient_keys(recipients.to_vec())
            .privacy_mode(privacy_mode)
            .affected_contract_transactions(affected_entries)
            .exec_hash(exec_hash.to_vec())
            .build()?;
        Ok(payload)
    }

    fn encrypt_raw_payload(
        &self,
        plain_text: &[u8],
        sender: &PublicKey,
    ) -> Result<RawTransaction> {
        let sender_private = *self.private_key_for(sender)?;

        let mut master_key = Self::generate_master_key();
        let nonce = Nonce::generate();
        let encrypted_payload = Self::seal(&master_key, &nonce, plain_text)?;

        let mut self_shared = self.shared_key(&sender_private, sender);
        let encrypted_key = Self::seal(&self_shared, &nonce, &master_key)?;
        self_shared.zeroize();
        master_key.zeroize();

        Ok(RawTransaction::new(
            encrypted_payload,
            encrypted_key,
            nonce,
            sender.clone(),
        ))
    }

    fn unencrypt_transaction(
        &self,
        payload: &EncodedPayload,
        recipient: &PublicKey,
    ) -> Result<Vec<u8>> {
        let (box_index, counterparty) = if recipient == payload.sender_key() {
            let counterparty = payload
                .recipient_keys()
                .first()
                .cloned()
                .ok_or(EnclaveError::RecipientBoxMissing)?;
            (0, counterparty)
        } else {
            // A projected payload may have dropped its key list; the single
            // remaining box is then the recipient's own.
            let index = payload
                .recipient_keys()
                .iter()
                .position(|k| k == recipient)
                .unwrap_or(0);
            (index, payload.sender_key().clone())
        };

        let private = *self.private_key_for(recipient)?;
        let boxed = payload
            .recipient_boxes()
            .get(box_index)
            .ok_or(EnclaveError::RecipientBoxMissing)?;

        let mut shared = self.shared_key(&private, &counterparty);
        let master_key = self.open_master_key(&shared, payload.recipient_nonce(), boxed)?;
        shared.zeroize();

        Self::open(
            &master_key,
            payload.cipher_text_nonce(),
            payload.cipher_text(),
        )
    }

    fn unencrypt_raw_payload(&self, raw: &RawTransaction) -> Result<Vec<u8>> {
        let private = *self.private_key_for(raw.from())?;
        let mut self_shared = self.shared_key(&private, raw.from());
        let master_key = self.open_master_key(&self_shared, raw.nonce(), raw.encrypted_key())?;
        self_shared.zeroize();
        Self::open(&master_key, raw.nonce(), raw.encrypted_payload())
    }

    fn find_invalid_security_hashes(
        &self,
        payload: &EncodedPayload,
        affected: &[AffectedTransaction],
    ) -> BTreeSet<MessageHash> {
        payload
            .affected_contract_transactions()
            .iter()
            .filter(|(hash, stored)| {
                match affected.iter().find(|a| a.hash() == hash) {
                    Some(resolved) => {
                        let expected =
                            security_hash(hash, resolved.payload().cipher_text(), payload.cipher_text());
                        !bool::from(expected.as_slice().ct_eq(stored.as_slice()))
                    }
                    // No payload to recompute against: the binding cannot
                    // be verified, so it does not stand.
                    None => true,
                }
            })
            .map(|(hash, _)| hash.clone())
            .collect()
    }
}
