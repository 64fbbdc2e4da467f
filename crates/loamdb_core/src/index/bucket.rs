//! Index entry storage: derived value to record-key set.

use crate::error::CoreResult;
use loamdb_storage::KvStore;
use std::sync::Arc;

/// The backing store for one index.
///
/// Keys are derived index values; each value holds a JSON array of the
/// record keys that produced it, in first-seen order.
///
/// The bucket does read-modify-write on key sets without coordination;
/// [`super::IndexEngine`] serializes mutations with its per-index lock.
#[derive(Clone)]
pub struct IndexBucket {
    store: Arc<dyn KvStore>,
}

impl IndexBucket {
    /// Wraps a key-value store as an index bucket.
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Returns the record keys stored under `value`, or empty if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or parsing fails.
    pub fn keys_for(&self, value: &str) -> CoreResult<Vec<String>> {
        match self.store.get(value.as_bytes())? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Adds `record_key` to the set under `value`.
    ///
    /// Membership is checked first, so re-adding a key is a no-op and the
    /// stored set never holds duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error if storage or serialization fails.
    pub fn add_key(&self, value: &str, record_key: &str) -> CoreResult<()> {
        let mut keys = self.keys_for(value)?;
        if keys.iter().any(|k| k == record_key) {
            return Ok(());
        }
        keys.push(record_key.to_string());
        self.store.put(value.as_bytes(), &serde_json::to_vec(&keys)?)?;
        Ok(())
    }

    /// Returns the number of distinct derived values in the bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn value_count(&self) -> CoreResult<usize> {
        Ok(self.store.len()?)
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
