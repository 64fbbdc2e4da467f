//! Write-behind cache for indexes under construction.

use crate::error::CoreResult;
use crate::record::Record;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// An append-only record cache for one building index.
///
/// While an index is building, every live write appends the full record here
/// as one JSON line. On activation the cache is drained into the index and
/// the file is deleted.
///
/// A missing file is an empty cache: the file is only created by the first
/// append, and draining removes it.
#[derive(Debug)]
pub struct WriteBehindCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl WriteBehindCache {
    /// Creates a cache handle at the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the cache file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record to the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn append(&self, record: &Record) -> CoreResult<()> {
        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut line = record.to_bytes()?;
        line.push(b'\n');
        file.write_all(&line)?;
        Ok(())
    }

    /// Drains the cache: reads every cached record, deletes the file, and
    /// returns the records in append order.
    ///
    /// A cache that was never written to drains to an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or removed.
    pub fn drain(&self) -> CoreResult<Vec<Record>> {
        let _guard = self.lock.lock();
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for line in data.lines() {
            if line.trim().is_empty() {
                continue;
            }
            records.push(Record::from_bytes(line.as_bytes())?);
        }
        std::fs::remove_file(&self.path)?;
        Ok(records)
    }
}
