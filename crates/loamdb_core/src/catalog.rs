//! Metadata catalog: workspaces, collections, indexes, shards.
//!
//! The catalog is the source of truth for all platform metadata. It lives
//! entirely in memory and, when opened against a data directory, persists
//! every mutation to `catalog.json` with an atomic temp-file-and-rename.

use crate::error::{CoreError, CoreResult};
use crate::record::KEY_FIELD;
use crate::types::{CollectionId, IndexId, ShardId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the persisted catalog inside the data directory.
pub const CATALOG_FILE: &str = "catalog.json";

/// Declared type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string field.
    String,
    /// Signed integer field.
    Int,
    /// Floating point field.
    Float,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// How an index derives its entry value from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// One field, coerced to the declared [`FieldType`].
    Single,
    /// Several string fields concatenated and digested to an MD5 hex string.
    Hash,
}

/// Lifecycle state of a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    /// Backfill in progress; live writes go to the write-behind cache.
    Building,
    /// Fully built and maintained inline by every write.
    Active,
    /// Present in the catalog but excluded from reads and writes.
    Inactive,
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "building"),
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// A tenant workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Stable workspace ID.
    pub id: WorkspaceId,
    /// Workspace name, unique across the platform.
    pub name: String,
}

/// A named set of schemaless records inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Stable collection ID, unique across all workspaces.
    pub id: CollectionId,
    /// Owning workspace.
    pub workspace_id: WorkspaceId,
    /// Collection name, unique within the workspace.
    pub name: String,
}

/// Definition of a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Stable index ID, unique across all collections.
    pub id: IndexId,
    /// Owning collection.
    pub collection_id: CollectionId,
    /// Index name, unique within the collection.
    pub name: String,
    /// Record fields the index reads.
    pub fields: Vec<String>,
    /// How the entry value is derived.
    pub kind: IndexKind,
    /// Declared type for [`IndexKind::Single`] coercion.
    pub field_type: FieldType,
    /// Whether a value may map to at most one record.
    pub unique: bool,
    /// Current lifecycle state.
    pub status: IndexStatus,
}

/// A shard of a collection.
///
/// Only the default shard 0 carries data today; additional shards are
/// catalog placeholders for future range placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Shard number within the collection.
    pub id: ShardId,
    /// Owning collection.
    pub collection_id: CollectionId,
    /// Field the shard keys on.
    pub key_field: String,
}

/// A collection together with its eagerly-loaded indexes and shards.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    /// The collection itself.
    pub collection: Collection,
    /// All indexes defined on the collection, in creation order.
    pub indexes: Vec<IndexDef>,
    /// All shards of the collection.
    pub shards: Vec<Shard>,
}

/// Persisted catalog state.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogState {
    workspaces: BTreeMap<u32, Workspace>,
    collections: BTreeMap<u32, Collection>,
    indexes: BTreeMap<u32, IndexDef>,
    shards: Vec<Shard>,
    next_workspace_id: u32,
    next_collection_id: u32,
    next_index_id: u32,
}

impl CatalogState {
    fn new() -> Self {
        Self {
            next_workspace_id: 1,
            next_collection_id: 1,
            next_index_id: 1,
            ..Self::default()
        }
    }
}

/// The metadata catalog.
///
/// All name lookups are scoped: workspace names are platform-wide,
/// collection names are per-workspace, index names are per-collection.
///
/// # Thread Safety
///
/// The catalog is not internally synchronized; callers wrap it in a lock.
#[derive(Debug)]
pub struct Catalog {
    state: CatalogState,
    path: Option<PathBuf>,
}

impl Catalog {
    /// Creates an empty in-memory catalog that never persists.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: CatalogState::new(),
            path: None,
        }
    }

    /// Opens the catalog under `dir`, loading `catalog.json` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(dir: &Path) -> CoreResult<Self> {
        let path = dir.join(CATALOG_FILE);
        let state = if path.exists() {
            let data = std::fs::read(&path)?;
            serde_json::from_slice(&data)?
        } else {
            CatalogState::new()
        };
        Ok(Self {
            state,
            path: Some(path),
        })
    }

    /// Persists the current state if a backing file is configured.
    ///
    /// The write is atomic: a temp file is written and renamed over the
    /// target, so readers never observe a half-written catalog.
    fn persist(&self) -> CoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = serde_json::to_vec_pretty(&self.state)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &data)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    // --- workspaces ---

    /// Creates a workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken.
    pub fn create_workspace(&mut self, name: &str) -> CoreResult<Workspace> {
        if self.state.workspaces.values().any(|w| w.name == name) {
            return Err(CoreError::already_exists("workspace", name));
        }
        let id = WorkspaceId::new(self.state.next_workspace_id);
        self.state.next_workspace_id += 1;
        let workspace = Workspace {
            id,
            name: name.to_string(),
        };
        self.state.workspaces.insert(id.as_u32(), workspace.clone());
        self.persist()?;
        tracing::info!(workspace = %id, name, "created workspace");
        Ok(workspace)
    }

    /// Looks up a workspace by name.
    ///
    /// # Errors
    ///
    /// Returns an error if no workspace carries the name.
    pub fn get_workspace(&self, name: &str) -> CoreResult<Workspace> {
        self.state
            .workspaces
            .values()
            .find(|w| w.name == name)
            .cloned()
            .ok_or_else(|| CoreError::workspace_not_found(name))
    }

    /// Returns all workspaces, ordered by ID.
    #[must_use]
    pub fn list_workspaces(&self) -> Vec<Workspace> {
        self.state.workspaces.values().cloned().collect()
    }

    // --- collections ---

    /// Creates a collection in a workspace, along with its default shard 0
    /// keyed on `_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace does not exist or the name is
    /// already taken within it.
    pub fn create_collection(
        &mut self,
        workspace_id: WorkspaceId,
        name: &str,
    ) -> CoreResult<Collection> {
        if !self.state.workspaces.contains_key(&workspace_id.as_u32()) {
            return Err(CoreError::workspace_not_found(workspace_id.to_string()));
        }
        let taken = self
            .state
            .collections
            .values()
            .any(|c| c.workspace_id == workspace_id && c.name == name);
        if taken {
            return Err(CoreError::already_exists("collection", name));
        }

        let id = CollectionId::new(self.state.next_collection_id);
        self.state.next_collection_id += 1;
        let collection = Collection {
            id,
            workspace_id,
            name: name.to_string(),
        };
        self.state.collections.insert(id.as_u32(), collection.clone());
        self.state.shards.push(Shard {
            id: ShardId::new(0),
            collection_id: id,
            key_field: KEY_FIELD.to_string(),
        });
        self.persist()?;
        tracing::info!(collection = %id, workspace = %workspace_id, name, "created collection");
        Ok(collection)
    }

    /// Looks up a collection by name within a workspace, returning it with
    /// its indexes and shards eagerly loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist.
    pub fn get_collection(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
    ) -> CoreResult<CollectionInfo> {
        let collection = self
            .state
            .collections
            .values()
            .find(|c| c.workspace_id == workspace_id && c.name == name)
            .cloned()
            .ok_or_else(|| CoreError::collection_not_found(name))?;
        Ok(self.collection_info(collection))
    }

    /// Looks up a collection by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist.
    pub fn get_collection_by_id(&self, id: CollectionId) -> CoreResult<CollectionInfo> {
        let collection = self
            .state
            .collections
            .get(&id.as_u32())
            .cloned()
            .ok_or_else(|| CoreError::collection_not_found(id.to_string()))?;
        Ok(self.collection_info(collection))
    }

    fn collection_info(&self, collection: Collection) -> CollectionInfo {
        let indexes = self
            .state
            .indexes
            .values()
            .filter(|i| i.collection_id == collection.id)
            .cloned()
            .collect();
        let shards = self
            .state
            .shards
            .iter()
            .filter(|s| s.collection_id == collection.id)
            .cloned()
            .collect();
        CollectionInfo {
            collection,
            indexes,
            shards,
        }
    }

    /// Returns all collections in a workspace, ordered by ID.
    #[must_use]
    pub fn list_collections(&self, workspace_id: WorkspaceId) -> Vec<Collection> {
        self.state
            .collections
            .values()
            .filter(|c| c.workspace_id == workspace_id)
            .cloned()
            .collect()
    }

    // --- indexes ---

    /// Registers a new index on a collection with status [`IndexStatus::Building`].
    ///
    /// The catalog only records the definition; the engine above drives the
    /// backfill and later flips the status to active.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist, the name is taken
    /// within it, the field list is empty, or a [`IndexKind::Single`] index
    /// declares more than one field.
    pub fn create_index(
        &mut self,
        collection_id: CollectionId,
        name: &str,
        fields: Vec<String>,
        kind: IndexKind,
        field_type: FieldType,
        unique: bool,
    ) -> CoreResult<IndexDef> {
        if !self.state.collections.contains_key(&collection_id.as_u32()) {
            return Err(CoreError::collection_not_found(collection_id.to_string()));
        }
        if fields.is_empty() {
            return Err(CoreError::invalid_operation("index needs at least one field"));
        }
        if kind == IndexKind::Single && fields.len() != 1 {
            return Err(CoreError::invalid_operation(
                "a single-field index takes exactly one field; use a hash index for composites",
            ));
        }
        let taken = self
            .state
            .indexes
            .values()
            .any(|i| i.collection_id == collection_id && i.name == name);
        if taken {
            return Err(CoreError::already_exists("index", name));
        }

        let id = IndexId::new(self.state.next_index_id);
        self.state.next_index_id += 1;
        let def = IndexDef {
            id,
            collection_id,
            name: name.to_string(),
            fields,
            kind,
            field_type,
            unique,
            status: IndexStatus::Building,
        };
        self.state.indexes.insert(id.as_u32(), def.clone());
        self.persist()?;
        tracing::info!(index = %id, collection = %collection_id, name, "registered index as building");
        Ok(def)
    }

    /// Looks up an index by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the index does not exist.
    pub fn get_index(&self, id: IndexId) -> CoreResult<IndexDef> {
        self.state
            .indexes
            .get(&id.as_u32())
            .cloned()
            .ok_or_else(|| CoreError::index_not_found(id))
    }

    /// Looks up an index together with its owning collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or its collection does not exist.
    pub fn get_index_with_collection(&self, id: IndexId) -> CoreResult<(IndexDef, Collection)> {
        let def = self.get_index(id)?;
        let collection = self
            .state
            .collections
            .get(&def.collection_id.as_u32())
            .cloned()
            .ok_or_else(|| CoreError::collection_not_found(def.collection_id.to_string()))?;
        Ok((def, collection))
    }

    /// Updates an index's lifecycle status and persists the change.
    ///
    /// # Errors
    ///
    /// Returns an error if the index does not exist.
    pub fn set_index_status(&mut self, id: IndexId, status: IndexStatus) -> CoreResult<()> {
        let def = self
            .state
            .indexes
            .get_mut(&id.as_u32())
            .ok_or_else(|| CoreError::index_not_found(id))?;
        let previous = def.status;
        def.status = status;
        self.persist()?;
        tracing::info!(index = %id, %previous, %status, "index status changed");
        Ok(())
    }

    /// Returns all indexes on a collection, ordered by ID.
    #[must_use]
    pub fn indexes_for_collection(&self, collection_id: CollectionId) -> Vec<IndexDef> {
        self.state
            .indexes
            .values()
            .filter(|i| i.collection_id == collection_id)
            .cloned()
            .collect()
    }
}
