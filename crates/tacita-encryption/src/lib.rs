//! # tacita-encryption
//!
//! Identifier and codec primitives for the Tacita transaction manager:
//!
//! - **PublicKey**: opaque 32-byte recipient/sender identifiers
//! - **Nonce**: 24-byte AEAD nonces carried inside payloads
//! - **MessageHash**: content address of a transaction, derived from its
//!   ciphertext with BLAKE3
//!
//! All external-facing identifiers render as standard padded base64.
//! This crate performs no encryption itself; key custody and ciphers live
//! behind the enclave boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod hash;
pub mod key;
pub mod nonce;

pub use error::{EncryptionError, Result};
pub use hash::MessageHash;
pub use key::PublicKey;
pub use nonce::Nonce;
