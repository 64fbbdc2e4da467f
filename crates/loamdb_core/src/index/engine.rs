//! Per-index lifecycle engine.

use super::bucket::IndexBucket;
use super::cache::WriteBehindCache;
use super::value::derive_index_value;
use crate::catalog::{IndexDef, IndexStatus};
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use parking_lot::{Mutex, RwLock};

/// The engine for one secondary index.
///
/// The engine owns the index's bucket, its write-behind cache, and its
/// lifecycle status, and serializes all mutations through one per-index
/// lock. There is exactly one engine instance per index ID; sharing it is
/// what makes the building-to-active handoff race-free.
///
/// # Locking
///
/// `insert` re-reads the status after taking the lock, and [`activate`]
/// flips the status and drains the cache while holding the same lock. A
/// writer that observed the building state before activation either appends
/// to the cache before the drain starts, or blocks on the lock and then
/// sees the active state. No write can land in the cache after the drain.
///
/// [`activate`]: IndexEngine::activate
pub struct IndexEngine {
    def: RwLock<IndexDef>,
    bucket: IndexBucket,
    cache: WriteBehindCache,
    write_lock: Mutex<()>,
}

impl IndexEngine {
    /// Creates an engine from a catalog definition, its bucket, and its
    /// cache handle.
    #[must_use]
    pub fn new(def: IndexDef, bucket: IndexBucket, cache: WriteBehindCache) -> Self {
        Self {
            def: RwLock::new(def),
            bucket,
            cache,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns a snapshot of the index definition.
    #[must_use]
    pub fn def(&self) -> IndexDef {
        self.def.read().clone()
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> IndexStatus {
        self.def.read().status
    }

    /// Routes one record write according to the index's current status.
    ///
    /// - Building: the record is appended to the write-behind cache
    /// - Active: the entry is derived and applied to the bucket
    /// - Inactive: the write is ignored
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UniqueViolation`] if the index is unique and the
    /// derived value already maps to a different record, or an error if
    /// derivation or storage fails.
    pub fn insert(&self, record: &Record) -> CoreResult<()> {
        let _guard = self.write_lock.lock();
        match self.def.read().status {
            IndexStatus::Building => self.cache.append(record),
            IndexStatus::Active => self.apply(record),
            IndexStatus::Inactive => Ok(()),
        }
    }

    /// Applies one record during backfill, bypassing the status check.
    ///
    /// The backfill scan calls this per record so live writers are never
    /// blocked for the duration of the whole scan.
    ///
    /// # Errors
    ///
    /// Returns an error if derivation or storage fails.
    pub fn backfill_record(&self, record: &Record) -> CoreResult<()> {
        let _guard = self.write_lock.lock();
        self.apply(record)
    }

    /// Flips the index to active and drains the write-behind cache into the
    /// bucket, all under the per-index lock. Returns the number of drained
    /// cache entries.
    ///
    /// A drained entry that violates a unique constraint is logged and
    /// skipped; the record already won its spot in the primary store, and
    /// aborting the drain would strand the rest of the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read or the bucket fails.
    pub fn activate(&self) -> CoreResult<usize> {
        let _guard = self.write_lock.lock();
        self.def.write().status = IndexStatus::Active;
        let drained = self.cache.drain()?;
        let count = drained.len();
        for record in &drained {
            match self.apply(record) {
                Ok(()) => {}
                Err(CoreError::UniqueViolation { index_name }) => {
                    tracing::warn!(
                        index = %self.def.read().id,
                        index_name,
                        "skipping cached record that violates unique constraint"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(count)
    }

    /// Sets the status directly, without touching the cache.
    pub fn set_status(&self, status: IndexStatus) {
        let _guard = self.write_lock.lock();
        self.def.write().status = status;
    }

    /// Returns the record keys indexed under `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] unless the index is active,
    /// or an error if storage fails.
    pub fn lookup(&self, value: &str) -> CoreResult<Vec<String>> {
        let def = self.def.read();
        if def.status != IndexStatus::Active {
            return Err(CoreError::invalid_operation(format!(
                "index {} is {}, not active",
                def.name, def.status
            )));
        }
        drop(def);
        self.bucket.keys_for(value)
    }

    /// Checks whether applying `record` would violate this index's unique
    /// constraint, without mutating anything.
    ///
    /// This is an advisory pre-check for request handlers; [`insert`] runs
    /// the authoritative check under the lock.
    ///
    /// [`insert`]: IndexEngine::insert
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UniqueViolation`] on a would-be violation, or an
    /// error if derivation or storage fails.
    pub fn check_constraint(&self, record: &Record) -> CoreResult<()> {
        let def = self.def.read().clone();
        if !def.unique || def.status != IndexStatus::Active {
            return Ok(());
        }
        let Some(value) = derive_index_value(&def, record)? else {
            return Ok(());
        };
        let keys = self.bucket.keys_for(&value.entry_key())?;
        let record_key = record.key()?;
        if keys.is_empty() || keys.iter().any(|k| k == record_key) {
            Ok(())
        } else {
            Err(CoreError::unique_violation(def.name))
        }
    }

    /// Derives and applies one entry. Callers hold `write_lock`.
    fn apply(&self, record: &Record) -> CoreResult<()> {
        let def = self.def.read().clone();
        let Some(value) = derive_index_value(&def, record)? else {
            return Ok(());
        };
        let entry = value.entry_key();
        let record_key = record.key()?;
        if def.unique {
            let keys = self.bucket.keys_for(&entry)?;
            if !keys.is_empty() && !keys.iter().any(|k| k == record_key) {
                return Err(CoreError::unique_violation(def.name));
            }
        }
        self.bucket.add_key(&entry, record_key)
    }

    /// Flushes the bucket's backing store.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> CoreResult<()> {
        self.bucket.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, IndexKind};
    use crate::types::{CollectionId, IndexId};
    use loamdb_storage::MemoryKv;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn engine(unique: bool, status: IndexStatus, cache_dir: &std::path::Path) -> IndexEngine {
        let def = IndexDef {
            id: IndexId::new(1),
            collection_id: CollectionId::new(1),
            name: "by_customer".to_string(),
            fields: vec!["customer".to_string()],
            kind: IndexKind::Single,
            field_type: FieldType::String,
            unique,
            status,
        };
        IndexEngine::new(
            def,
            IndexBucket::new(Arc::new(MemoryKv::new())),
            WriteBehindCache::new(cache_dir.join("data.json")),
        )
    }

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn active_insert_and_lookup() {
        let dir = tempdir().unwrap();
        let e = engine(false, IndexStatus::Active, dir.path());

        e.insert(&record(json!({"_key": "o1", "customer": "carol"}))).unwrap();
        e.insert(&record(json!({"_key": "o2", "customer": "carol"}))).unwrap();

        assert_eq!(e.lookup("carol").unwrap(), vec!["o1", "o2"]);
        assert!(e.lookup("dave").unwrap().is_empty());
    }

    #[test]
    fn building_insert_goes_to_cache() {
        let dir = tempdir().unwrap();
        let e = engine(false, IndexStatus::Building, dir.path());

        e.insert(&record(json!({"_key": "o1", "customer": "carol"}))).unwrap();
        // Not visible yet
        assert!(e.lookup("carol").is_err());
        assert!(dir.path().join("data.json").exists());

        let drained = e.activate().unwrap();
        assert_eq!(drained, 1);
        assert_eq!(e.lookup("carol").unwrap(), vec!["o1"]);
        assert!(!dir.path().join("data.json").exists());
    }

    #[test]
    fn inactive_insert_is_ignored() {
        let dir = tempdir().unwrap();
        let e = engine(false, IndexStatus::Inactive, dir.path());

        e.insert(&record(json!({"_key": "o1", "customer": "carol"}))).unwrap();
        e.set_status(IndexStatus::Active);
        assert!(e.lookup("carol").unwrap().is_empty());
    }

    #[test]
    fn unique_rejects_second_record() {
        let dir = tempdir().unwrap();
        let e = engine(true, IndexStatus::Active, dir.path());

        e.insert(&record(json!({"_key": "u1", "customer": "carol"}))).unwrap();
        let err = e
            .insert(&record(json!({"_key": "u2", "customer": "carol"})))
            .unwrap_err();
        assert!(matches!(err, CoreError::UniqueViolation { .. }));
        assert_eq!(e.lookup("carol").unwrap(), vec!["u1"]);
    }

    #[test]
    fn unique_same_record_is_idempotent() {
        let dir = tempdir().unwrap();
        let e = engine(true, IndexStatus::Active, dir.path());

        let r = record(json!({"_key": "u1", "customer": "carol"}));
        e.insert(&r).unwrap();
        e.insert(&r).unwrap();
        assert_eq!(e.lookup("carol").unwrap(), vec!["u1"]);
    }

    #[test]
    fn record_without_field_not_indexed() {
        let dir = tempdir().unwrap();
        let e = engine(false, IndexStatus::Active, dir.path());

        e.insert(&record(json!({"_key": "o1"}))).unwrap();
        assert_eq!(e.bucket.value_count().unwrap(), 0);
    }

    #[test]
    fn activate_skips_violating_cache_entry() {
        let dir = tempdir().unwrap();
        let e = engine(true, IndexStatus::Building, dir.path());

        // Backfill claims the value for u1
        e.backfill_record(&record(json!({"_key": "u1", "customer": "carol"}))).unwrap();
        // Cached write for a different record with the same value
        e.insert(&record(json!({"_key": "u2", "customer": "carol"}))).unwrap();

        e.activate().unwrap();
        assert_eq!(e.lookup("carol").unwrap(), vec!["u1"]);
    }

    #[test]
    fn check_constraint_is_advisory() {
        let dir = tempdir().unwrap();
        let e = engine(true, IndexStatus::Active, dir.path());

        e.insert(&record(json!({"_key": "u1", "customer": "carol"}))).unwrap();

        assert!(e.check_constraint(&record(json!({"_key": "u1", "customer": "carol"}))).is_ok());
        assert!(e.check_constraint(&record(json!({"_key": "u2", "customer": "dave"}))).is_ok());
        assert!(e.check_constraint(&record(json!({"_key": "u2", "customer": "carol"}))).is_err());
    }
}
