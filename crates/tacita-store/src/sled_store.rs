//! Sled-backed store.
//!
//! One sled tree per record kind, keyed by the raw hash bytes, values
//! bincode-encoded. Sled iterates trees in key order, which gives the
//! stable paging the `TransactionStore` contract requires.

use std::path::Path;

use tacita_encryption::MessageHash;

use crate::{
    EncryptedRawTransaction, EncryptedTransaction, RawTransactionStore, Result, StoreError,
    TransactionStore,
};

/// Tree holding distributed transactions.
const TRANSACTIONS_TREE: &str = "encrypted-transactions";

/// Tree holding pre-distribution raw transactions.
const RAW_TRANSACTIONS_TREE: &str = "encrypted-raw-transactions";

/// A durable store over a sled database.
///
/// Implements both store traits; the two record kinds live in separate
/// trees of the same database file.
pub struct SledStore {
    transactions: sled::Tree,
    raw_transactions: sled::Tree,
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("transactions", &self.transactions.len())
            .field("raw_transactions", &self.raw_transactions.len())
            .finish()
    }
}

impl SledStore {
    /// Open or create a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| StoreError::Database(format!("Failed to open database: {}", e)))?;
        Self::new(db)
    }

    /// Wrap an already opened sled database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if a tree cannot be opened.
    pub fn new(db: sled::Db) -> Result<Self> {
        let transactions = db
            .open_tree(TRANSACTIONS_TREE)
            .map_err(|e| StoreError::Database(format!("Failed to open tree: {}", e)))?;
        let raw_transactions = db
            .open_tree(RAW_TRANSACTIONS_TREE)
            .map_err(|e| StoreError::Database(format!("Failed to open tree: {}", e)))?;
        Ok(Self {
            transactions,
            raw_transactions,
        })
    }

    /// Flush all pending writes to disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the flush fails.
    pub fn flush(&self) -> Result<()> {
        self.transactions
            .flush()
            .and_then(|_| self.raw_transactions.flush())
            .map_err(|e| StoreError::Database(format!("Failed to flush: {}", e)))?;
        Ok(())
    }

    fn encode<T: serde::Serialize>(record: &T) -> Result<Vec<u8>> {
        bincode::serialize(record).map_err(|e| StoreError::Corruption(e.to_string()))
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Corruption(e.to_string()))
    }
}

impl TransactionStore for SledStore {
    fn save(&self, transaction: &EncryptedTransaction) -> Result<()> {
        let value = Self::encode(transaction)?;
        self.transactions
            .insert(transaction.hash().as_bytes(), value)
            .map_err(|e| StoreError::Database(format!("Failed to insert: {}", e)))?;
        Ok(())
    }

    fn delete(&self, hash: &MessageHash) -> Result<bool> {
        let removed = self
            .transactions
            .remove(hash.as_bytes())
            .map_err(|e| StoreError::Database(format!("Failed to delete: {}", e)))?;
        Ok(removed.is_some())
    }

    fn retrieve_by_hash(&self, hash: &MessageHash) -> Result<Option<EncryptedTransaction>> {
        match self
            .transactions
            .get(hash.as_bytes())
            .map_err(|e| StoreError::Database(format!("Failed to get: {}", e)))?
        {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn find_by_hashes(&self, hashes: &[MessageHash]) -> Result<Vec<EncryptedTransaction>> {
        let mut found = Vec::new();
        for hash in hashes {
            if let Some(record) = TransactionStore::retrieve_by_hash(self, hash)? {
                found.push(record);
            }
        }
        Ok(found)
    }

    fn retrieve_transactions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<EncryptedTransaction>> {
        self.transactions
            .iter()
            .skip(offset)
            .take(limit)
            .map(|entry| {
                let (_, bytes) = entry
                    .map_err(|e| StoreError::Database(format!("Iterator error: {}", e)))?;
                Self::decode(&bytes)
            })
            .collect()
    }

    fn transaction_count(&self) -> Result<usize> {
        Ok(self.transactions.len())
    }
}

impl RawTransactionStore for SledStore {
    fn save(&self, transaction: &EncryptedRawTransaction) -> Result<()> {
        let value = Self::encode(transaction)?;
        self.raw_transactions
            .insert(transaction.hash().as_bytes(), value)
            .map_err(|e| StoreError::Database(format!("Failed to insert: {}", e)))?;
        Ok(())
    }

    fn retrieve_by_hash(&self, hash: &MessageHash) -> Result<Option<EncryptedRawTransaction>> {
        match self
            .raw_transactions
            .get(hash.as_bytes())
            .map_err(|e| StoreError::Database(format!("Failed to get: {}", e)))?
        {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}
