//! Wire messages for the LoamDB server.
//!
//! Requests and responses travel as single JSON lines over the connection.
//! Errors carry an HTTP-style status code so thin clients can classify them
//! without parsing messages.

use loamdb_core::{FieldType, IndexKind, IndexStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Create a workspace.
    CreateWorkspace {
        /// Workspace name.
        name: String,
    },
    /// Create a collection in a workspace.
    CreateCollection {
        /// Workspace name.
        workspace: String,
        /// Collection name.
        name: String,
    },
    /// Create and build an index on a collection.
    CreateIndex {
        /// Workspace name.
        workspace: String,
        /// Collection name.
        collection: String,
        /// Index name.
        index_name: String,
        /// Record fields the index reads.
        fields: Vec<String>,
        /// Derivation kind.
        index_type: IndexKind,
        /// Declared field type for single-field coercion.
        data_type: FieldType,
        /// Whether the index enforces uniqueness.
        is_unique: bool,
    },
    /// Toggle an index between active and inactive.
    SetIndexStatus {
        /// Index ID.
        index_id: u32,
        /// New status.
        status: IndexStatus,
    },
    /// Apply a record write synchronously, bypassing the queue.
    ForceWrite {
        /// Workspace name.
        workspace: String,
        /// Collection name.
        collection: String,
        /// The record, a JSON object carrying `_key`.
        record: Value,
    },
    /// Submit a record write.
    Write {
        /// Workspace name.
        workspace: String,
        /// Collection name.
        collection: String,
        /// The record, a JSON object carrying `_key`.
        record: Value,
    },
    /// Fetch a record by `_key`.
    Read {
        /// Workspace name.
        workspace: String,
        /// Collection name.
        collection: String,
        /// Record key.
        key: String,
    },
    /// Find records through a named index.
    FindByIndex {
        /// Workspace name.
        workspace: String,
        /// Collection name.
        collection: String,
        /// Index name.
        index: String,
        /// Derived value to look up.
        value: String,
    },
    /// List the collections of a workspace.
    ListCollections {
        /// Workspace name.
        workspace: String,
    },
}

/// A server response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    /// A created workspace.
    Workspace {
        /// Workspace ID.
        id: u32,
        /// Workspace name.
        name: String,
    },
    /// A created collection.
    Collection {
        /// Collection ID.
        id: u32,
        /// Collection name.
        name: String,
    },
    /// A created or updated index.
    Index {
        /// Index ID.
        id: u32,
        /// Index name.
        name: String,
        /// Lifecycle status after the operation.
        status: IndexStatus,
    },
    /// A write was accepted into the queue.
    Accepted {
        /// The record's `_key`.
        key: String,
    },
    /// A single record.
    Record {
        /// The record as a JSON object.
        record: Value,
    },
    /// A set of records.
    Records {
        /// The records as JSON objects.
        records: Vec<Value>,
    },
    /// Collection names.
    Collections {
        /// The names, in creation order.
        collections: Vec<String>,
    },
    /// Generic success.
    Ok,
    /// An error with an HTTP-style status.
    Error {
        /// Status code (400, 404, 409, 500).
        status: u16,
        /// Human-readable message.
        message: String,
    },
}

impl Response {
    /// Converts an API error into an error response.
    #[must_use]
    pub fn from_error(err: &crate::error::ApiError) -> Self {
        Self::Error {
            status: err.status_code(),
            message: err.to_string(),
        }
    }
}
