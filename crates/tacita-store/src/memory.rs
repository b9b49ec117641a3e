//! In-memory store backends.
//!
//! Records live in a `RwLock<BTreeMap>` keyed by hash, so paging walks
//! records in hash order and is stable across calls. Nothing persists
//! across restarts.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tacita_encryption::MessageHash;

use crate::{
    EncryptedRawTransaction, EncryptedTransaction, RawTransactionStore, Result, StoreError,
    TransactionStore,
};

/// In-memory distributed transaction store.
#[derive(Default)]
pub struct MemoryTransactionStore {
    records: RwLock<BTreeMap<MessageHash, EncryptedTransaction>>,
}

impl MemoryTransactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<MessageHash, EncryptedTransaction>>> {
        self.records
            .read()
            .map_err(|_| StoreError::Database("store lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<MessageHash, EncryptedTransaction>>> {
        self.records
            .write()
            .map_err(|_| StoreError::Database("store lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for MemoryTransactionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.records.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("MemoryTransactionStore")
            .field("records", &count)
            .finish()
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn save(&self, transaction: &EncryptedTransaction) -> Result<()> {
        self.write()?
            .insert(transaction.hash().clone(), transaction.clone());
        Ok(())
    }

    fn delete(&self, hash: &MessageHash) -> Result<bool> {
        Ok(self.write()?.remove(hash).is_some())
    }

    fn retrieve_by_hash(&self, hash: &MessageHash) -> Result<Option<EncryptedTransaction>> {
        Ok(self.read()?.get(hash).cloned())
    }

    fn find_by_hashes(&self, hashes: &[MessageHash]) -> Result<Vec<EncryptedTransaction>> {
        let records = self.read()?;
        Ok(hashes
            .iter()
            .filter_map(|hash| records.get(hash).cloned())
            .collect())
    }

    fn retrieve_transactions(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<EncryptedTransaction>> {
        Ok(self
            .read()?
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn transaction_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

/// In-memory raw transaction store.
#[derive(Default)]
pub struct MemoryRawTransactionStore {
    records: RwLock<BTreeMap<MessageHash, EncryptedRawTransaction>>,
}

impl MemoryRawTransactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryRawTransactionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.records.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("MemoryRawTransactionStore")
            .field("records", &count)
            .finish()
    }
}

impl RawTransactionStore for MemoryRawTransactionStore {
    fn save(&self, transaction: &EncryptedRawTransaction) -> Result<()> {
        self.records
            .write()
            .map_err(|_| StoreError::Database("store lock poisoned".to_string()))?
            .insert(transaction.hash().clone(), transaction.clone());
        Ok(())
    }

    fn retrieve_by_hash(&self, hash: &MessageHash) -> Result<Option<EncryptedRawTransaction>> {
        Ok(self
            .records
            .read()
            .map_err(|_| StoreError::Database("store lock poisoned".to_string()))?
            .get(hash)
            .cloned())
    }
}
