//! Key-value store trait definition.

use crate::error::StorageResult;

/// A low-level key-value store for LoamDB.
///
/// Stores are **opaque byte maps**. They provide point reads and writes plus
/// ordered prefix iteration. LoamDB owns all key and value interpretation -
/// stores do not understand records, index entries, or catalog metadata.
///
/// # Invariants
///
/// - `get` observes the latest completed `put` for the same key
/// - `scan_prefix` returns a consistent snapshot, ordered by key, that is not
///   mutated mid-iteration by the caller's own scan
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryKv`] - For testing and ephemeral deployments
/// - [`super::FileKv`] - For persistent storage
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Removes the entry under `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Returns all entries whose key starts with `prefix`, ordered by key.
    ///
    /// The result is a snapshot taken under one lock acquisition.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Flushes all pending writes to durable storage.
    ///
    /// After this returns successfully, all previously written data is
    /// guaranteed to survive process termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&self) -> StorageResult<()>;

    /// Returns the number of live entries in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the count cannot be determined.
    fn len(&self) -> StorageResult<usize>;

    /// Returns true if the store holds no live entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the count cannot be determined.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
