//! Data directory management.
//!
//! This module handles the file system layout for a LoamDB data directory:
//!
//! ```text
//! <data_path>/
//! ├─ LOCK                                       # Advisory lock, single process
//! ├─ catalog.json                               # Persisted catalog
//! ├─ collection/
//! │  └─ primary.db                              # Primary record store
//! ├─ index/
//! │  └─ collection_id_1_index_id_2.db           # One store per index
//! └─ cache/
//!    └─ collection_id_1/index_id_2/data.json    # Write-behind caches
//! ```
//!
//! The LOCK file ensures only one process operates on the directory at a time.

use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionId, IndexId};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";

/// Pool name of the shared primary store.
pub const PRIMARY_STORE: &str = "collection/primary";

/// Manages the data directory structure and file locking.
///
/// # Thread Safety
///
/// `DataDir` holds an exclusive advisory lock on the directory. Only one
/// instance can exist per directory at a time, across processes.
#[derive(Debug)]
pub struct DataDir {
    path: PathBuf,
    _lock_file: File,
}

impl DataDir {
    /// Opens or creates a data directory and takes its exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns `DirectoryLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_operation(format!(
                    "data directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_operation(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::DirectoryLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the pool name for an index's backing store.
    #[must_use]
    pub fn index_store_name(collection_id: CollectionId, index_id: IndexId) -> String {
        format!(
            "index/collection_id_{}_index_id_{}",
            collection_id.as_u32(),
            index_id.as_u32()
        )
    }

    /// Returns the path of an index's write-behind cache file.
    #[must_use]
    pub fn cache_path(&self, collection_id: CollectionId, index_id: IndexId) -> PathBuf {
        self.path
            .join("cache")
            .join(format!("collection_id_{}", collection_id.as_u32()))
            .join(format!("index_id_{}", index_id.as_u32()))
            .join("data.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dir_creates_when_missing() {
        let base = tempdir().unwrap();
        let path = base.path().join("data");

        let dir = DataDir::open(&path, true).unwrap();
        assert!(path.is_dir());
        assert!(path.join("LOCK").exists());
        assert_eq!(dir.path(), path);
    }

    #[test]
    fn dir_requires_existing_without_create() {
        let base = tempdir().unwrap();
        let path = base.path().join("missing");
        assert!(DataDir::open(&path, false).is_err());
    }

    #[test]
    fn dir_lock_is_exclusive() {
        let base = tempdir().unwrap();
        let path = base.path().join("data");

        let _held = DataDir::open(&path, true).unwrap();
        let err = DataDir::open(&path, true).unwrap_err();
        assert!(matches!(err, CoreError::DirectoryLocked));
    }

    #[test]
    fn dir_lock_released_on_drop() {
        let base = tempdir().unwrap();
        let path = base.path().join("data");

        drop(DataDir::open(&path, true).unwrap());
        assert!(DataDir::open(&path, true).is_ok());
    }

    #[test]
    fn dir_store_and_cache_names() {
        let base = tempdir().unwrap();
        let dir = DataDir::open(base.path(), true).unwrap();

        assert_eq!(
            DataDir::index_store_name(CollectionId::new(3), IndexId::new(7)),
            "index/collection_id_3_index_id_7"
        );
        let cache = dir.cache_path(CollectionId::new(3), IndexId::new(7));
        assert!(cache.ends_with("cache/collection_id_3/index_id_7/data.json"));
    }
}
