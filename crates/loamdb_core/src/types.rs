//! Core type definitions for LoamDB.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a workspace (tenant).
///
/// Workspace IDs are stable and assigned when workspaces are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub u32);

impl WorkspaceId {
    /// Creates a new workspace ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws:{}", self.0)
    }
}

/// Identifier for a collection.
///
/// Collection IDs are unique across all workspaces, so every key prefix and
/// backing file name derived from one names exactly one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub u32);

impl CollectionId {
    /// Creates a new collection ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col:{}", self.0)
    }
}

/// Identifier for a secondary index.
///
/// Index IDs are unique across all collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexId(pub u32);

impl IndexId {
    /// Creates a new index ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "idx:{}", self.0)
    }
}

/// Identifier for a shard within a collection.
///
/// Every collection starts with shard 0; further shards are catalog-only
/// placeholders until range-based placement lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardId(pub u32);

impl ShardId {
    /// Creates a new shard ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_ordering() {
        assert!(CollectionId::new(1) < CollectionId::new(2));
        assert!(IndexId::new(9) > IndexId::new(3));
    }

    #[test]
    fn id_display() {
        assert_eq!(WorkspaceId::new(7).to_string(), "ws:7");
        assert_eq!(CollectionId::new(1).to_string(), "col:1");
        assert_eq!(IndexId::new(2).to_string(), "idx:2");
        assert_eq!(ShardId::new(0).to_string(), "shard:0");
    }

    #[test]
    fn id_serde_transparent() {
        let id = CollectionId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: CollectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
