//! Error types for LoamDB core.

use crate::types::{CollectionId, IndexId};
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in LoamDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] loamdb_storage::StorageError),

    /// JSON serialization or parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record is missing the mandatory `_key` field.
    #[error("record is missing the _key field")]
    MissingKey,

    /// A record's `_key` is present but not a string.
    #[error("record _key must be a string")]
    InvalidKey,

    /// A unique index already maps this value to a different record.
    #[error("unique constraint violated on index {index_name}")]
    UniqueViolation {
        /// Name of the violated index.
        index_name: String,
    },

    /// The primary store already holds a record under this key.
    #[error("duplicate record key {key:?} in collection {collection_id}")]
    DuplicateKey {
        /// The collection written to.
        collection_id: CollectionId,
        /// The `_key` that already exists.
        key: String,
    },

    /// No record under the requested key.
    #[error("record not found: {key:?} in collection {collection_id}")]
    RecordNotFound {
        /// The collection searched.
        collection_id: CollectionId,
        /// The `_key` that was not found.
        key: String,
    },

    /// Workspace does not exist in the catalog.
    #[error("workspace not found: {name}")]
    WorkspaceNotFound {
        /// Name of the workspace.
        name: String,
    },

    /// Collection does not exist in the catalog.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// Index does not exist in the catalog.
    #[error("index not found: {index_id}")]
    IndexNotFound {
        /// The index ID that was not found.
        index_id: IndexId,
    },

    /// A name is already taken within its scope.
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// What kind of object collided (workspace, collection, index).
        kind: &'static str,
        /// The colliding name.
        name: String,
    },

    /// A record field could not be coerced to the index's declared type.
    #[error("field {field:?} cannot be read as {expected}")]
    FieldCoercion {
        /// Name of the offending field.
        field: String,
        /// The declared field type.
        expected: &'static str,
    },

    /// The platform directory is locked by another process.
    #[error("data directory locked: another process has exclusive access")]
    DirectoryLocked,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a unique-violation error.
    pub fn unique_violation(index_name: impl Into<String>) -> Self {
        Self::UniqueViolation {
            index_name: index_name.into(),
        }
    }

    /// Creates a duplicate-key error.
    pub fn duplicate_key(collection_id: CollectionId, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            collection_id,
            key: key.into(),
        }
    }

    /// Creates a record-not-found error.
    pub fn record_not_found(collection_id: CollectionId, key: impl Into<String>) -> Self {
        Self::RecordNotFound {
            collection_id,
            key: key.into(),
        }
    }

    /// Creates a workspace-not-found error.
    pub fn workspace_not_found(name: impl Into<String>) -> Self {
        Self::WorkspaceNotFound { name: name.into() }
    }

    /// Creates a collection-not-found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates an index-not-found error.
    #[must_use]
    pub const fn index_not_found(index_id: IndexId) -> Self {
        Self::IndexNotFound { index_id }
    }

    /// Creates an already-exists error.
    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Creates a field-coercion error.
    pub fn field_coercion(field: impl Into<String>, expected: &'static str) -> Self {
        Self::FieldCoercion {
            field: field.into(),
            expected,
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
