//! # tacita-enclave
//!
//! The key custody boundary of the Tacita transaction manager.
//!
//! The [`Enclave`] trait is the only surface through which the manager
//! touches private key material: sealing a payload for a recipient set,
//! opening a payload with a local key, and verifying the security hashes
//! that bind a transaction to its affected transactions. The manager never
//! sees a private key or a master key.
//!
//! [`MemoryEnclave`] is the in-process implementation: X25519 static key
//! pairs, BLAKE3-derived shared keys, and XChaCha20-Poly1305 sealing. Each
//! payload uses a fresh random master key, sealed once per recipient.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod enclave;
pub mod error;
pub mod memory;
pub mod security;

pub use enclave::{Enclave, RawTransaction};
pub use error::{EnclaveError, Result};
pub use memory::MemoryEnclave;
pub use security::security_hash;
