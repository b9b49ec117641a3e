//! Public key identifiers.
//!
//! A `PublicKey` is an opaque fixed-length byte string. The manager treats
//! keys purely as identifiers: equality is byte equality, and the actual
//! curve behind a key is the enclave's concern.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{EncryptionError, Result};

/// Size of a public key in bytes.
pub const KEY_SIZE: usize = 32;

/// An opaque 32-byte public key.
///
/// Keys identify senders and recipients on payloads and index the private
/// material held by the enclave. They hash and compare by bytes, so they
/// can be used directly for set membership.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; KEY_SIZE],
}

impl PublicKey {
    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(EncryptionError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Convert to an owned byte array.
    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.bytes
    }

    /// Render the key as standard padded base64.
    pub fn encode_to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    /// Parse a key from standard padded base64.
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

impl From<[u8; KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PublicKey({:02x}{:02x}..)",
            self.bytes[0], self.bytes[1]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_roundtrip() {
        let bytes = [0x42u8; KEY_SIZE];
        let key = PublicKey::from_bytes(&bytes).unwrap();
        assert_eq!(key.as_bytes(), &bytes);
        assert_eq!(key.to_bytes(), bytes);
    }

    #[test]
    fn test_from_bytes_invalid_length() {
        let result = PublicKey::from_bytes(&[0u8; 16]);
        assert!(matches!(
            result,
            Err(EncryptionError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_base64_roundtrip() {
        let key = PublicKey::from_bytes(&[0xABu8; KEY_SIZE]).unwrap();
        let encoded = key.encode_to_base64();
        let decoded = PublicKey::from_base64(&encoded).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(PublicKey::from_base64("not!!base64").is_err());
        // Valid base64, wrong length
        assert!(PublicKey::from_base64("aGVsbG8=").is_err());
    }

    #[test]
    fn test_equality_by_bytes() {
        let a = PublicKey::from_bytes(&[1u8; KEY_SIZE]).unwrap();
        let b = PublicKey::from_bytes(&[1u8; KEY_SIZE]).unwrap();
        let c = PublicKey::from_bytes(&[2u8; KEY_SIZE]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_debug_truncates() {
        let key = PublicKey::from_bytes(&[0xFFu8; KEY_SIZE]).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.starts_with("PublicKey(ffff"));
        assert!(debug.len() < 20);
    }
}
