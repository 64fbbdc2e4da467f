//! Per-collection read and write pipeline.

use crate::catalog::Collection;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexEngine;
use crate::primary::PrimaryStore;
use crate::record::Record;
use std::sync::Arc;

/// The engine for one collection: its primary store plus the engines of all
/// its indexes.
///
/// Instances are cheap views assembled per operation; the index engines they
/// reference are shared platform-wide, one per index ID.
#[derive(Clone)]
pub struct CollectionEngine {
    collection: Collection,
    primary: PrimaryStore,
    indexes: Vec<Arc<IndexEngine>>,
}

impl CollectionEngine {
    /// Assembles a collection engine.
    #[must_use]
    pub fn new(
        collection: Collection,
        primary: PrimaryStore,
        indexes: Vec<Arc<IndexEngine>>,
    ) -> Self {
        Self {
            collection,
            primary,
            indexes,
        }
    }

    /// Returns the collection this engine serves.
    #[must_use]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Returns the shared index engines, in index-ID order.
    #[must_use]
    pub fn indexes(&self) -> &[Arc<IndexEngine>] {
        &self.indexes
    }

    /// Checks every unique active index for a would-be violation, without
    /// writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UniqueViolation`] naming the first violated
    /// index, or an error if derivation or storage fails.
    pub fn check_constraints(&self, record: &Record) -> CoreResult<()> {
        for index in &self.indexes {
            index.check_constraint(record)?;
        }
        Ok(())
    }

    /// Applies one record write: constraint checks, then the primary store,
    /// then every index.
    ///
    /// Building indexes receive the record via their write-behind cache;
    /// inactive indexes ignore it.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no valid `_key`, a constraint is
    /// violated, the key already exists in the primary store, or storage
    /// fails.
    pub fn write(&self, record: &Record) -> CoreResult<()> {
        let key = record.key()?;
        self.check_constraints(record)?;
        self.primary.insert(self.collection.id, record)?;
        for index in &self.indexes {
            index.insert(record)?;
        }
        tracing::debug!(collection = %self.collection.id, key, "applied record write");
        Ok(())
    }

    /// Fetches a record by its `_key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordNotFound`] if absent.
    pub fn get(&self, key: &str) -> CoreResult<Record> {
        self.primary.get(self.collection.id, key)
    }

    /// Finds records through a named index.
    ///
    /// Only an active index serves reads; a building or inactive index is an
    /// invalid target.
    ///
    /// # Errors
    ///
    /// Returns an error if the index does not exist on this collection, is
    /// not active, or storage fails.
    pub fn find_by_index(&self, index_name: &str, value: &str) -> CoreResult<Vec<Record>> {
        let index = self
            .indexes
            .iter()
            .find(|i| i.def().name == index_name)
            .ok_or_else(|| {
                CoreError::invalid_operation(format!(
                    "collection {} has no index named {index_name}",
                    self.collection.name
                ))
            })?;
        let keys = index.lookup(value)?;
        keys.iter().map(|key| self.primary.get(self.collection.id, key)).collect()
    }

    /// Returns every record in the collection, in `_key` order.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn scan(&self) -> CoreResult<Vec<Record>> {
        self.primary.scan_collection(self.collection.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, IndexDef, IndexKind, IndexStatus};
    use crate::index::{IndexBucket, WriteBehindCache};
    use crate::types::{CollectionId, IndexId, WorkspaceId};
    use loamdb_storage::MemoryKv;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn index_engine(
        id: u32,
        name: &str,
        field: &str,
        unique: bool,
        status: IndexStatus,
        cache_dir: &std::path::Path,
    ) -> Arc<IndexEngine> {
        let def = IndexDef {
            id: IndexId::new(id),
            collection_id: CollectionId::new(1),
            name: name.to_string(),
            fields: vec![field.to_string()],
            kind: IndexKind::Single,
            field_type: FieldType::String,
            unique,
            status,
        };
        Arc::new(IndexEngine::new(
            def,
            IndexBucket::new(Arc::new(MemoryKv::new())),
            WriteBehindCache::new(cache_dir.join(format!("idx_{id}.json"))),
        ))
    }

    fn engine(indexes: Vec<Arc<IndexEngine>>) -> CollectionEngine {
        let collection = Collection {
            id: CollectionId::new(1),
            workspace_id: WorkspaceId::new(1),
            name: "orders".to_string(),
        };
        CollectionEngine::new(collection, PrimaryStore::new(Arc::new(MemoryKv::new())), indexes)
    }

    #[test]
    fn write_then_read_by_key() {
        let e = engine(vec![]);
        e.write(&record(json!({"_key": "o1", "amount": 5}))).unwrap();
        assert_eq!(e.get("o1").unwrap().get("amount"), Some(&json!(5)));
    }

    #[test]
    fn write_requires_key() {
        let e = engine(vec![]);
        let err = e.write(&record(json!({"amount": 5}))).unwrap_err();
        assert!(matches!(err, CoreError::MissingKey));
    }

    #[test]
    fn write_maintains_active_index() {
        let dir = tempdir().unwrap();
        let e = engine(vec![index_engine(
            1,
            "by_customer",
            "customer",
            false,
            IndexStatus::Active,
            dir.path(),
        )]);

        e.write(&record(json!({"_key": "o1", "customer": "carol"}))).unwrap();
        e.write(&record(json!({"_key": "o2", "customer": "carol"}))).unwrap();
        e.write(&record(json!({"_key": "o3", "customer": "dave"}))).unwrap();

        let found = e.find_by_index("by_customer", "carol").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].key().unwrap(), "o1");
    }

    #[test]
    fn unique_violation_leaves_primary_untouched() {
        let dir = tempdir().unwrap();
        let e = engine(vec![index_engine(
            1,
            "by_email",
            "email",
            true,
            IndexStatus::Active,
            dir.path(),
        )]);

        e.write(&record(json!({"_key": "u1", "email": "a@x"}))).unwrap();
        let err = e.write(&record(json!({"_key": "u2", "email": "a@x"}))).unwrap_err();
        assert!(matches!(err, CoreError::UniqueViolation { .. }));
        // The violating record never reached the primary store
        assert!(e.get("u2").is_err());
    }

    #[test]
    fn reads_exclude_building_index() {
        let dir = tempdir().unwrap();
        let e = engine(vec![index_engine(
            1,
            "by_customer",
            "customer",
            false,
            IndexStatus::Building,
            dir.path(),
        )]);

        e.write(&record(json!({"_key": "o1", "customer": "carol"}))).unwrap();
        assert!(e.find_by_index("by_customer", "carol").is_err());
        // But the record itself is readable by key
        assert!(e.get("o1").is_ok());
    }

    #[test]
    fn unknown_index_name() {
        let e = engine(vec![]);
        assert!(e.find_by_index("nope", "v").is_err());
    }

    #[test]
    fn scan_returns_key_order() {
        let e = engine(vec![]);
        e.write(&record(json!({"_key": "b"}))).unwrap();
        e.write(&record(json!({"_key": "a"}))).unwrap();

        let all = e.scan().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].key().unwrap(), "a");
    }
}
