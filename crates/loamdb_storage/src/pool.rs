//! Pool of named store handles.

use crate::error::StorageResult;
use crate::file::FileKv;
use crate::kv::KvStore;
use crate::memory::MemoryKv;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// How the pool materializes stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolMode {
    /// All stores live in memory. For tests and ephemeral deployments.
    Memory,
    /// Each store is one log file named `<name>.db` under the given directory.
    File(PathBuf),
}

/// A pool of lazily-opened, named key-value stores.
///
/// The pool hands out shared handles: asking for the same name twice returns
/// the same underlying store. Handles stay open for the lifetime of the pool;
/// nothing closes a store during normal operation.
///
/// # Thread Safety
///
/// The pool is thread-safe and intended to be shared behind an `Arc`.
pub struct KvPool {
    mode: PoolMode,
    stores: RwLock<HashMap<String, Arc<dyn KvStore>>>,
}

impl fmt::Debug for KvPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvPool")
            .field("mode", &self.mode)
            .field("open", &self.open_names())
            .finish()
    }
}

impl KvPool {
    /// Creates a pool in the given mode.
    #[must_use]
    pub fn new(mode: PoolMode) -> Self {
        Self {
            mode,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an in-memory pool.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(PoolMode::Memory)
    }

    /// Creates a file-backed pool rooted at `dir`.
    #[must_use]
    pub fn file_backed(dir: impl Into<PathBuf>) -> Self {
        Self::new(PoolMode::File(dir.into()))
    }

    /// Returns the handle for `name`, opening the store on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if a file-backed store cannot be opened.
    pub fn open(&self, name: &str) -> StorageResult<Arc<dyn KvStore>> {
        if let Some(store) = self.stores.read().get(name) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write();
        // Another thread may have opened it while we waited for the lock
        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }

        let store: Arc<dyn KvStore> = match &self.mode {
            PoolMode::Memory => Arc::new(MemoryKv::new()),
            PoolMode::File(dir) => {
                let path = dir.join(format!("{name}.db"));
                Arc::new(FileKv::open_with_create_dirs(&path)?)
            }
        };
        stores.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Returns true if a store named `name` has already been opened.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stores.read().contains_key(name)
    }

    /// Flushes every open store.
    ///
    /// # Errors
    ///
    /// Returns the first flush error encountered.
    pub fn flush_all(&self) -> StorageResult<()> {
        let stores = self.stores.read();
        for store in stores.values() {
            store.flush()?;
        }
        Ok(())
    }

    /// Returns the names of all open stores.
    #[must_use]
    pub fn open_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }
}
