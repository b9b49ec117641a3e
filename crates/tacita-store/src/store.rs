//! Store traits.

use tacita_encryption::MessageHash;

use crate::{EncryptedRawTransaction, EncryptedTransaction, Result};

/// Persistence for distributed transactions.
///
/// Implementations must make `save` atomic with respect to concurrent
/// reads and must page `retrieve_transactions` in a stable order so a
/// caller walking `(offset, limit)` windows visits every record exactly
/// once in the absence of concurrent writes.
pub trait TransactionStore: Send + Sync {
    /// Save a record, replacing any record under the same hash.
    fn save(&self, transaction: &EncryptedTransaction) -> Result<()>;

    /// Delete a record.
    ///
    /// Returns whether a record was present. Deleting an absent hash is
    /// not an error.
    fn delete(&self, hash: &MessageHash) -> Result<bool>;

    /// Load a record by hash.
    fn retrieve_by_hash(&self, hash: &MessageHash) -> Result<Option<EncryptedTransaction>>;

    /// Load the records present among `hashes`, in request order.
    ///
    /// Absent hashes are simply not represented in the result; the caller
    /// decides whether that is an error.
    fn find_by_hashes(&self, hashes: &[MessageHash]) -> Result<Vec<EncryptedTransaction>>;

    /// Load one page of records in the store's stable order.
    fn retrieve_transactions(&self, offset: usize, limit: usize)
        -> Result<Vec<EncryptedTransaction>>;

    /// Count the stored records.
    fn transaction_count(&self) -> Result<usize>;
}

/// Persistence for pre-distribution raw transactions.
pub trait RawTransactionStore: Send + Sync {
    /// Save a record, replacing any record under the same hash.
    fn save(&self, transaction: &EncryptedRawTransaction) -> Result<()>;

    /// Load a record by hash.
    fn retrieve_by_hash(&self, hash: &MessageHash) -> Result<Option<EncryptedRawTransaction>>;
}
