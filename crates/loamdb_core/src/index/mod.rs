//! Secondary indexes.
//!
//! An index maps a derived value to the set of record keys that produced it.
//! Indexes are built online: a new index starts in the building state, live
//! writes detour into a write-behind cache, and activation drains the cache
//! before the index serves reads.

mod bucket;
mod cache;
mod engine;
mod value;

pub use bucket::IndexBucket;
pub use cache::WriteBehindCache;
pub use engine::IndexEngine;
pub use value::{derive_index_value, IndexValue};
