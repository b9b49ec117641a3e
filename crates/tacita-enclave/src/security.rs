//! Security hashes binding a transaction to its affected transactions.

use tacita_encryption::MessageHash;

/// Domain separator for security hashing.
const SECURITY_HASH_DOMAIN: &[u8] = b"TACITA-SECURITY-HASH-v1";

/// Compute the security hash for one affected transaction entry.
///
/// The hash covers the affected transaction's address and ciphertext plus
/// the new transaction's ciphertext, each length-prefixed, so any node
/// holding both payloads can recompute it without key material. A payload
/// claiming an affected transaction it was not built against will not
/// produce a matching value.
pub fn security_hash(
    affected_hash: &MessageHash,
    affected_cipher_text: &[u8],
    new_cipher_text: &[u8],
) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new();
    for input in [
        SECURITY_HASH_DOMAIN,
        affected_hash.as_bytes().as_slice(),
        affected_cipher_text,
        new_cipher_text,
    ] {
        hasher.update(&(input.len() as u64).to_le_bytes());
        hasher.update(input);
    }
    hasher.finalize().as_bytes().to_vec()
}
