//! # LoamDB Storage
//!
//! Low-level key-value storage for LoamDB.
//!
//! This crate provides the [`KvStore`] trait plus two implementations:
//!
//! - [`MemoryKv`] - In-memory store for testing and ephemeral use
//! - [`FileKv`] - Log-structured file store with checksummed frames
//!
//! [`KvPool`] hands out shared, lazily-opened store handles by name, which is
//! how the engine above maps collections and indexes onto backing files.
//!
//! ## Design
//!
//! Stores are opaque byte maps: point reads and writes plus ordered prefix
//! iteration. All interpretation of keys and values happens in `loamdb_core`.
//!
//! ## Example
//!
//! ```
//! use loamdb_storage::{KvPool, KvStore};
//!
//! let pool = KvPool::in_memory();
//! let store = pool.open("primary").unwrap();
//! store.put(b"1||order-1", b"{}").unwrap();
//! assert_eq!(store.get(b"1||order-1").unwrap(), Some(b"{}".to_vec()));
//! ```

mod error;
mod file;
mod kv;
mod memory;
mod pool;

pub use error::{StorageError, StorageResult};
pub use file::{compute_crc32, FileKv};
pub use kv::KvStore;
pub use memory::MemoryKv;
pub use pool::{KvPool, PoolMode};
