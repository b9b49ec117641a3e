//! # tacita-store
//!
//! Content-addressed persistence for encrypted transactions.
//!
//! Records are keyed by the transaction hash (the digest of the
//! ciphertext) and stored as opaque encoded bytes; this crate never
//! decodes payloads. Two backends implement the store traits:
//!
//! - [`MemoryTransactionStore`] / [`MemoryRawTransactionStore`]:
//!   `RwLock<BTreeMap>` backends with stable paging order, for tests and
//!   embedded use
//! - [`SledStore`]: a sled database with one tree per record kind
//!
//! Saves are atomic per record; a concurrent reader observes either the
//! pre-state or the committed post-state, never a partial write.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod model;
pub mod sled_store;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{MemoryRawTransactionStore, MemoryTransactionStore};
pub use model::{EncryptedRawTransaction, EncryptedTransaction};
pub use sled_store::SledStore;
pub use store::{RawTransactionStore, TransactionStore};
