//! Transaction hashes.
//!
//! A `MessageHash` is the content address of a transaction: the BLAKE3
//! digest of its ciphertext under a fixed domain separator. The same hash
//! type references affected contract transactions on a payload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{EncryptionError, Result};

/// Size of a transaction hash in bytes.
pub const HASH_SIZE: usize = 32;

/// Domain separator for transaction hashing.
const TXN_HASH_DOMAIN: &[u8] = b"TACITA-TXN-HASH-v1";

/// A 256-bit transaction hash.
///
/// Hashes are equal iff byte-equal and derive deterministically from the
/// ciphertext, so a payload re-encoded by any node addresses the same
/// record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageHash {
    bytes: [u8; HASH_SIZE],
}

impl MessageHash {
    /// Create a hash from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HASH_SIZE {
            return Err(EncryptionError::InvalidHashLength {
                expected: HASH_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Derive the transaction hash for a ciphertext.
    ///
    /// The input is length-prefixed under a fixed domain separator, so a
    /// ciphertext hashes to the same value on every node.
    pub fn from_cipher_text(cipher_text: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(TXN_HASH_DOMAIN.len() as u64).to_le_bytes());
        hasher.update(TXN_HASH_DOMAIN);
        hasher.update(&(cipher_text.len() as u64).to_le_bytes());
        hasher.update(cipher_text);
        let hash = hasher.finalize();
        Self {
            bytes: *hash.as_bytes(),
        }
    }

    /// Get the hash as a byte slice.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.bytes
    }

    /// Convert to an owned byte array.
    pub fn to_bytes(&self) -> [u8; HASH_SIZE] {
        self.bytes
    }

    /// Compare against another hash in constant time.
    pub fn constant_time_eq(&self, other: &MessageHash) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }

    /// Render the hash as standard padded base64.
    pub fn encode_to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    /// Parse a hash from standard padded base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid base64 or does not decode
    /// to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| EncryptionError::InvalidBase64(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Display for MessageHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode_to_base64())
    }
}

impl std::fmt::Debug for MessageHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MessageHash({})", self.encode_to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cipher_text_deterministic() {
        let a = MessageHash::from_cipher_text(b"ciphertext");
        let b = MessageHash::from_cipher_text(b"ciphertext");
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_cipher_text_differs_by_input() {
        let a = MessageHash::from_cipher_text(b"ciphertext-a");
        let b = MessageHash::from_cipher_text(b"ciphertext-b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_bytes_invalid_length() {
        let result = MessageHash::from_bytes(&[0u8; 31]);
        assert!(matches!(
            result,
            Err(EncryptionError::InvalidHashLength {
                expected: HASH_SIZE,
                actual: 31
            })
        ));
    }

    #[test]
    fn test_base64_roundtrip() {
        let hash = MessageHash::from_cipher_text(b"some data");
        let restored = MessageHash::from_base64(&hash.encode_to_base64()).unwrap();
        assert_eq!(hash, restored);
    }

    #[test]
    fn test_display_is_base64() {
        let hash = MessageHash::from_cipher_text(b"x");
        assert_eq!(format!("{}", hash), hash.encode_to_base64());
    }

    #[test]
    fn test_constant_time_eq() {
        let a = MessageHash::from_cipher_text(b"same");
        let b = MessageHash::from_cipher_text(b"same");
        let c = MessageHash::from_cipher_text(b"other");
        assert!(a.constant_time_eq(&b));
        assert!(!a.constant_time_eq(&c));
    }
}
