//! In-memory key-value store for testing.

use crate::error::StorageResult;
use crate::kv::KvStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory key-value store.
///
/// This store keeps all data in a `BTreeMap` and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral deployments that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryKv {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all entries from the store.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn flush(&self) -> StorageResult<()> {
        // In-memory store has no pending writes
        Ok(())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.entries.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let store = MemoryKv::new();
        assert_eq!(store.len().unwrap(), 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn memory_put_and_get() {
        let store = MemoryKv::new();
        store.put(b"k1", b"v1").unwrap();

        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get(b"missing").unwrap(), None);
    }

    #[test]
    fn memory_put_overwrites() {
        let store = MemoryKv::new();
        store.put(b"k", b"old").unwrap();
        store.put(b"k", b"new").unwrap();

        assert_eq!(store.get(b"k").unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn memory_delete() {
        let store = MemoryKv::new();
        store.put(b"k", b"v").unwrap();
        store.delete(b"k").unwrap();

        assert_eq!(store.get(b"k").unwrap(), None);

        // Deleting an absent key is not an error
        store.delete(b"k").unwrap();
    }

    #[test]
    fn memory_scan_prefix_ordered() {
        let store = MemoryKv::new();
        store.put(b"a||2", b"two").unwrap();
        store.put(b"a||1", b"one").unwrap();
        store.put(b"b||1", b"other").unwrap();

        let entries = store.scan_prefix(b"a||").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, b"a||1");
        assert_eq!(entries[1].0, b"a||2");
    }

    #[test]
    fn memory_scan_prefix_empty() {
        let store = MemoryKv::new();
        store.put(b"x", b"v").unwrap();

        let entries = store.scan_prefix(b"y").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn memory_clear() {
        let store = MemoryKv::new();
        store.put(b"k", b"v").unwrap();
        store.clear();
        assert!(store.is_empty().unwrap());
    }
}
