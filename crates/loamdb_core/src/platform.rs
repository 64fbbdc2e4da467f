//! Platform facade: the top-level entry point for embedding LoamDB.

use crate::catalog::{
    Catalog, Collection, CollectionInfo, FieldType, IndexDef, IndexKind, IndexStatus, Workspace,
    CATALOG_FILE,
};
use crate::collection::CollectionEngine;
use crate::config::Config;
use crate::dir::{DataDir, PRIMARY_STORE};
use crate::error::{CoreError, CoreResult};
use crate::index::{IndexBucket, IndexEngine, WriteBehindCache};
use crate::primary::PrimaryStore;
use crate::queue::{WriteJob, WriteQueue};
use crate::record::Record;
use crate::types::{CollectionId, IndexId};
use loamdb_storage::KvPool;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The LoamDB platform: catalog, stores, index engines, and write queue
/// behind one handle.
///
/// There is exactly one [`IndexEngine`] per index ID for the lifetime of the
/// platform, shared by every write path and by index construction.
///
/// # Thread Safety
///
/// The platform is thread-safe; wrap it in an `Arc` and share it between the
/// request handler and the write consumer.
pub struct Platform {
    config: Config,
    dir: DataDir,
    catalog: RwLock<Catalog>,
    pool: KvPool,
    engines: RwLock<HashMap<IndexId, Arc<IndexEngine>>>,
    queue: WriteQueue,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("path", &self.dir.path())
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl Platform {
    /// Opens a platform rooted at `path`.
    ///
    /// The directory is created and locked, the catalog is loaded, and an
    /// engine is rehydrated for every index the catalog knows, with its
    /// persisted status. An index that crashed mid-build comes back as
    /// building and stays there until rebuilt.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be locked, the catalog is
    /// unreadable, `error_if_exists` is set and data is already present, or
    /// a backing store cannot be opened.
    pub fn open(path: &Path, config: Config) -> CoreResult<Self> {
        if config.error_if_exists && path.join(CATALOG_FILE).exists() {
            return Err(CoreError::invalid_operation(format!(
                "data already exists at {}",
                path.display()
            )));
        }
        let dir = DataDir::open(path, config.create_if_missing)?;
        let catalog = if config.in_memory {
            Catalog::in_memory()
        } else {
            Catalog::open(dir.path())?
        };
        let pool = if config.in_memory {
            KvPool::in_memory()
        } else {
            KvPool::file_backed(dir.path())
        };

        let platform = Self {
            config,
            dir,
            catalog: RwLock::new(catalog),
            pool,
            engines: RwLock::new(HashMap::new()),
            queue: WriteQueue::new(),
        };

        // Rehydrate engines so persisted index statuses are live
        let defs: Vec<IndexDef> = {
            let catalog = platform.catalog.read();
            catalog
                .list_workspaces()
                .iter()
                .flat_map(|ws| catalog.list_collections(ws.id))
                .flat_map(|col| catalog.indexes_for_collection(col.id))
                .collect()
        };
        for def in defs {
            platform.engine_for(&def)?;
        }

        tracing::info!(path = %platform.dir.path().display(), "platform opened");
        Ok(platform)
    }

    /// Returns the platform configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the write queue.
    #[must_use]
    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    // --- catalog operations ---

    /// Creates a workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or persistence fails.
    pub fn create_workspace(&self, name: &str) -> CoreResult<Workspace> {
        self.catalog.write().create_workspace(name)
    }

    /// Looks up a workspace by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace does not exist.
    pub fn get_workspace(&self, name: &str) -> CoreResult<Workspace> {
        self.catalog.read().get_workspace(name)
    }

    /// Returns all workspaces.
    #[must_use]
    pub fn list_workspaces(&self) -> Vec<Workspace> {
        self.catalog.read().list_workspaces()
    }

    /// Creates a collection in the named workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace is missing, the name is taken
    /// within it, or persistence fails.
    pub fn create_collection(&self, workspace: &str, name: &str) -> CoreResult<Collection> {
        let mut catalog = self.catalog.write();
        let ws = catalog.get_workspace(workspace)?;
        catalog.create_collection(ws.id, name)
    }

    /// Looks up a collection with its indexes and shards.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace or collection is missing.
    pub fn get_collection(&self, workspace: &str, name: &str) -> CoreResult<CollectionInfo> {
        let catalog = self.catalog.read();
        let ws = catalog.get_workspace(workspace)?;
        catalog.get_collection(ws.id, name)
    }

    /// Returns all collections in the named workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace is missing.
    pub fn list_collections(&self, workspace: &str) -> CoreResult<Vec<Collection>> {
        let catalog = self.catalog.read();
        let ws = catalog.get_workspace(workspace)?;
        Ok(catalog.list_collections(ws.id))
    }

    // --- index construction ---

    /// Creates an index and builds it online.
    ///
    /// The sequence is the heart of online construction:
    ///
    /// 1. Register the definition as building (persisted)
    /// 2. Backfill from a primary-store scan, record by record
    /// 3. Persist the active status
    /// 4. Flip the live engine to active and drain its write-behind cache
    ///
    /// Live writes keep flowing throughout: while the index is building they
    /// detour into the cache, and the activation drain folds them in.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog rejects the definition, or if the
    /// backfill hits a coercion failure or unique violation in existing
    /// data. A failed backfill leaves the index in the building state.
    pub fn create_index(
        &self,
        workspace: &str,
        collection: &str,
        name: &str,
        fields: Vec<String>,
        kind: IndexKind,
        field_type: FieldType,
        unique: bool,
    ) -> CoreResult<IndexDef> {
        let collection_id = self.get_collection(workspace, collection)?.collection.id;
        let def = self
            .catalog
            .write()
            .create_index(collection_id, name, fields, kind, field_type, unique)?;
        let engine = self.engine_for(&def)?;

        let primary = self.primary()?;
        let records = primary.scan_collection(collection_id)?;
        let scanned = records.len();
        for record in &records {
            engine.backfill_record(record)?;
        }

        // Catch-up pass: a writer that read the catalog just before the
        // index was registered may have landed in the primary store after
        // the first scan without going through the engine. Entry application
        // is idempotent, so re-scanning is safe.
        for record in &primary.scan_collection(collection_id)? {
            engine.backfill_record(record)?;
        }

        self.catalog.write().set_index_status(def.id, IndexStatus::Active)?;
        let drained = engine.activate()?;
        tracing::info!(index = %def.id, name, scanned, drained, "index built and activated");

        self.catalog.read().get_index(def.id)
    }

    /// Updates an index's status in both the catalog and the live engine.
    ///
    /// This is the administrative toggle between active and inactive; it
    /// does not touch the write-behind cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is missing or persistence fails.
    pub fn set_index_status(&self, index_id: IndexId, status: IndexStatus) -> CoreResult<()> {
        let (def, collection) = {
            let mut catalog = self.catalog.write();
            catalog.set_index_status(index_id, status)?;
            catalog.get_index_with_collection(index_id)?
        };
        if let Some(engine) = self.engines.read().get(&index_id) {
            engine.set_status(status);
        }
        tracing::info!(index = def.name, collection = collection.name, %status, "index status set");
        Ok(())
    }

    // --- record operations ---

    /// Validates a write and enqueues it for the consumer.
    ///
    /// The pre-checks (key present, key not already taken, no unique
    /// violation) give the caller a synchronous rejection; the consumer
    /// re-runs the authoritative checks when it applies the job.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no valid `_key`, the key already
    /// exists, or a unique constraint would be violated.
    pub fn enqueue_write(&self, collection_id: CollectionId, record: Record) -> CoreResult<()> {
        let engine = self.collection_engine(collection_id)?;
        let key = record.key()?;
        if self.primary()?.exists(collection_id, key)? {
            return Err(CoreError::duplicate_key(collection_id, key));
        }
        engine.check_constraints(&record)?;
        self.queue.push(WriteJob {
            collection_id,
            record,
        });
        Ok(())
    }

    /// Applies one queued write. Called by the consumer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails its authoritative checks or
    /// storage fails.
    pub fn apply_write(&self, job: &WriteJob) -> CoreResult<()> {
        let engine = self.collection_engine(job.collection_id)?;
        engine.write(&job.record)?;
        if self.config.flush_on_write {
            self.pool.flush_all()?;
        }
        Ok(())
    }

    /// Writes a record synchronously, bypassing the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_direct(&self, collection_id: CollectionId, record: &Record) -> CoreResult<()> {
        self.collection_engine(collection_id)?.write(record)
    }

    /// Fetches a record by `_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection or record is missing.
    pub fn read(&self, workspace: &str, collection: &str, key: &str) -> CoreResult<Record> {
        let id = self.get_collection(workspace, collection)?.collection.id;
        self.collection_engine(id)?.get(key)
    }

    /// Finds records through a named active index.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection or index is missing, or the index
    /// is not active.
    pub fn find_by_index(
        &self,
        workspace: &str,
        collection: &str,
        index_name: &str,
        value: &str,
    ) -> CoreResult<Vec<Record>> {
        let id = self.get_collection(workspace, collection)?.collection.id;
        self.collection_engine(id)?.find_by_index(index_name, value)
    }

    /// Returns every record in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is missing or storage fails.
    pub fn scan(&self, workspace: &str, collection: &str) -> CoreResult<Vec<Record>> {
        let id = self.get_collection(workspace, collection)?.collection.id;
        self.collection_engine(id)?.scan()
    }

    /// Flushes every open store.
    ///
    /// # Errors
    ///
    /// Returns an error if a flush fails.
    pub fn flush(&self) -> CoreResult<()> {
        self.pool.flush_all()?;
        Ok(())
    }

    // --- assembly ---

    /// Assembles the engine view of a collection by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is missing or a store cannot be
    /// opened.
    pub fn collection_engine(&self, collection_id: CollectionId) -> CoreResult<CollectionEngine> {
        let info = self.catalog.read().get_collection_by_id(collection_id)?;
        let mut indexes = Vec::with_capacity(info.indexes.len());
        for def in &info.indexes {
            indexes.push(self.engine_for(def)?);
        }
        Ok(CollectionEngine::new(info.collection, self.primary()?, indexes))
    }

    fn primary(&self) -> CoreResult<PrimaryStore> {
        Ok(PrimaryStore::new(self.pool.open(PRIMARY_STORE)?))
    }

    /// Returns the shared engine for an index, creating it on first use.
    fn engine_for(&self, def: &IndexDef) -> CoreResult<Arc<IndexEngine>> {
        if let Some(engine) = self.engines.read().get(&def.id) {
            return Ok(Arc::clone(engine));
        }
        let mut engines = self.engines.write();
        if let Some(engine) = engines.get(&def.id) {
            return Ok(Arc::clone(engine));
        }
        let store = self
            .pool
            .open(&DataDir::index_store_name(def.collection_id, def.id))?;
        let cache = WriteBehindCache::new(self.dir.cache_path(def.collection_id, def.id));
        let engine = Arc::new(IndexEngine::new(def.clone(), IndexBucket::new(store), cache));
        engines.insert(def.id, Arc::clone(&engine));
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn open_platform(path: &Path) -> Platform {
        Platform::open(path, Config::new().in_memory(true)).unwrap()
    }

    fn seed_orders(platform: &Platform) -> CollectionId {
        platform.create_workspace("acme").unwrap();
        let col = platform.create_collection("acme", "orders").unwrap();
        col.id
    }

    #[test]
    fn platform_write_and_read() {
        let dir = tempdir().unwrap();
        let platform = open_platform(dir.path());
        let cid = seed_orders(&platform);

        platform
            .write_direct(cid, &record(json!({"_key": "o1", "customer": "carol"})))
            .unwrap();
        let fetched = platform.read("acme", "orders", "o1").unwrap();
        assert_eq!(fetched.get("customer"), Some(&json!("carol")));
    }

    #[test]
    fn platform_enqueue_then_apply() {
        let dir = tempdir().unwrap();
        let platform = open_platform(dir.path());
        let cid = seed_orders(&platform);

        platform
            .enqueue_write(cid, record(json!({"_key": "o1"})))
            .unwrap();
        assert_eq!(platform.queue().len(), 1);
        // Not visible until the consumer applies it
        assert!(platform.read("acme", "orders", "o1").is_err());

        let job = platform.queue().pop().unwrap();
        platform.apply_write(&job).unwrap();
        assert!(platform.read("acme", "orders", "o1").is_ok());
    }

    #[test]
    fn platform_enqueue_rejects_duplicate() {
        let dir = tempdir().unwrap();
        let platform = open_platform(dir.path());
        let cid = seed_orders(&platform);

        platform.write_direct(cid, &record(json!({"_key": "o1"}))).unwrap();
        let err = platform
            .enqueue_write(cid, record(json!({"_key": "o1"})))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));
    }

    #[test]
    fn platform_index_over_existing_data() {
        let dir = tempdir().unwrap();
        let platform = open_platform(dir.path());
        let cid = seed_orders(&platform);

        platform
            .write_direct(cid, &record(json!({"_key": "o1", "customer": "carol"})))
            .unwrap();
        platform
            .write_direct(cid, &record(json!({"_key": "o2", "customer": "dave"})))
            .unwrap();

        let def = platform
            .create_index(
                "acme",
                "orders",
                "by_customer",
                vec!["customer".to_string()],
                IndexKind::Single,
                FieldType::String,
                false,
            )
            .unwrap();
        assert_eq!(def.status, IndexStatus::Active);

        let found = platform
            .find_by_index("acme", "orders", "by_customer", "carol")
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key().unwrap(), "o1");
    }

    #[test]
    fn platform_inactive_index_not_readable() {
        let dir = tempdir().unwrap();
        let platform = open_platform(dir.path());
        let cid = seed_orders(&platform);
        platform
            .write_direct(cid, &record(json!({"_key": "o1", "customer": "carol"})))
            .unwrap();

        let def = platform
            .create_index(
                "acme",
                "orders",
                "by_customer",
                vec!["customer".to_string()],
                IndexKind::Single,
                FieldType::String,
                false,
            )
            .unwrap();

        platform.set_index_status(def.id, IndexStatus::Inactive).unwrap();
        assert!(platform
            .find_by_index("acme", "orders", "by_customer", "carol")
            .is_err());

        // New writes skip the inactive index, but reactivation serves old data
        platform.set_index_status(def.id, IndexStatus::Active).unwrap();
        assert_eq!(
            platform
                .find_by_index("acme", "orders", "by_customer", "carol")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn platform_unique_hash_index() {
        let dir = tempdir().unwrap();
        let platform = open_platform(dir.path());
        let cid = seed_orders(&platform);

        platform
            .create_index(
                "acme",
                "orders",
                "by_pair",
                vec!["a".to_string(), "b".to_string()],
                IndexKind::Hash,
                FieldType::String,
                true,
            )
            .unwrap();

        platform
            .write_direct(cid, &record(json!({"_key": "o1", "a": "x", "b": "y"})))
            .unwrap();
        let err = platform
            .write_direct(cid, &record(json!({"_key": "o2", "a": "x", "b": "y"})))
            .unwrap_err();
        assert!(matches!(err, CoreError::UniqueViolation { .. }));
    }

    #[test]
    fn platform_persists_catalog_and_data() {
        let dir = tempdir().unwrap();

        {
            let platform = Platform::open(dir.path(), Config::new()).unwrap();
            let cid = seed_orders(&platform);
            platform
                .write_direct(cid, &record(json!({"_key": "o1", "customer": "carol"})))
                .unwrap();
            platform
                .create_index(
                    "acme",
                    "orders",
                    "by_customer",
                    vec!["customer".to_string()],
                    IndexKind::Single,
                    FieldType::String,
                    false,
                )
                .unwrap();
            platform.flush().unwrap();
        }

        let platform = Platform::open(dir.path(), Config::new()).unwrap();
        assert!(platform.read("acme", "orders", "o1").is_ok());
        let found = platform
            .find_by_index("acme", "orders", "by_customer", "carol")
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn platform_second_open_is_locked() {
        let dir = tempdir().unwrap();
        let held = Platform::open(dir.path(), Config::new()).unwrap();
        assert!(format!("{held:?}").starts_with("Platform"));

        let err = Platform::open(dir.path(), Config::new()).unwrap_err();
        assert!(matches!(err, CoreError::DirectoryLocked));
    }
}
