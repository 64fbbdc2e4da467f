//! # LoamDB Core
//!
//! Core engine for LoamDB, a lightweight multi-tenant data platform.
//!
//! This crate provides:
//! - Catalog of workspaces, collections, indexes, and shards
//! - Primary record store keyed by the mandatory `_key` field
//! - Secondary indexes with online construction and unique constraints
//! - Write-behind caching for indexes under construction
//! - An in-process write queue with a background consumer
//!
//! The entry point is [`Platform`]:
//!
//! ```
//! use loamdb_core::{Config, Platform, Record};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let platform = Platform::open(dir.path(), Config::new().in_memory(true)).unwrap();
//!
//! platform.create_workspace("acme").unwrap();
//! let orders = platform.create_collection("acme", "orders").unwrap();
//!
//! let record = Record::from_value(json!({"_key": "o1", "customer": "carol"})).unwrap();
//! platform.write_direct(orders.id, &record).unwrap();
//! assert!(platform.read("acme", "orders", "o1").is_ok());
//! ```

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod catalog;
pub mod collection;
pub mod config;
pub mod dir;
pub mod error;
pub mod index;
pub mod primary;
pub mod queue;
pub mod record;
pub mod types;

mod platform;

pub use catalog::{
    Catalog, Collection, CollectionInfo, FieldType, IndexDef, IndexKind, IndexStatus, Shard,
    Workspace,
};
pub use collection::CollectionEngine;
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use index::{IndexEngine, IndexValue};
pub use platform::Platform;
pub use primary::PrimaryStore;
pub use queue::{Consumer, WriteJob, WriteQueue};
pub use record::{Record, KEY_FIELD};
pub use types::{CollectionId, IndexId, ShardId, WorkspaceId};
