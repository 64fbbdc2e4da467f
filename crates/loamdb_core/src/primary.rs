//! Primary record store.

use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::types::CollectionId;
use loamdb_storage::KvStore;
use std::sync::Arc;

/// Separator between the collection ID and the record key in primary keys.
const KEY_SEP: &str = "||";

/// The primary store: records from every collection in one key-value store,
/// namespaced by collection ID.
///
/// Keys are `"{collection_id}||{record_key}"`, so one prefix scan yields a
/// whole collection in record-key order.
#[derive(Clone)]
pub struct PrimaryStore {
    store: Arc<dyn KvStore>,
}

impl PrimaryStore {
    /// Wraps a key-value store as the primary record store.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn record_key(collection_id: CollectionId, key: &str) -> Vec<u8> {
        format!("{}{}{}", collection_id.as_u32(), KEY_SEP, key).into_bytes()
    }

    fn collection_prefix(collection_id: CollectionId) -> Vec<u8> {
        format!("{}{}", collection_id.as_u32(), KEY_SEP).into_bytes()
    }

    /// Inserts a record under its `_key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateKey`] if the collection already holds a
    /// record under the same key, or an error if the record has no valid
    /// `_key` or storage fails.
    pub fn insert(&self, collection_id: CollectionId, record: &Record) -> CoreResult<()> {
        let key = record.key()?;
        let storage_key = Self::record_key(collection_id, key);
        if self.store.get(&storage_key)?.is_some() {
            return Err(CoreError::duplicate_key(collection_id, key));
        }
        self.store.put(&storage_key, &record.to_bytes()?)?;
        Ok(())
    }

    /// Returns true if the collection holds a record under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn exists(&self, collection_id: CollectionId, key: &str) -> CoreResult<bool> {
        Ok(self.store.get(&Self::record_key(collection_id, key))?.is_some())
    }

    /// Fetches the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordNotFound`] if absent, or an error if
    /// storage or parsing fails.
    pub fn get(&self, collection_id: CollectionId, key: &str) -> CoreResult<Record> {
        let bytes = self
            .store
            .get(&Self::record_key(collection_id, key))?
            .ok_or_else(|| CoreError::record_not_found(collection_id, key))?;
        Record::from_bytes(&bytes)
    }

    /// Returns every record in the collection, in record-key order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or parsing fails.
    pub fn scan_collection(&self, collection_id: CollectionId) -> CoreResult<Vec<Record>> {
        let prefix = Self::collection_prefix(collection_id);
        let entries = self.store.scan_prefix(&prefix)?;
        entries
            .into_iter()
            .map(|(_, value)| Record::from_bytes(&value))
            .collect()
    }

    /// Flushes the underlying store.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> CoreResult<()> {
        self.store.flush()?;
        Ok(())
    }
}
