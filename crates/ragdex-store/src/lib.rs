//! ragdex-store
//!
//! Snapshot persistence and the shared [`IndexStore`].
pub mod builder;
pub mod snapshot;
pub mod store;

pub use builder::{build_index, build_index_with, content_hash, BuiltIndex};
pub use snapshot::{Snapshot, FORMAT_VERSION};
pub use store::{IndexOrigin, IndexStats, IndexStore, IndexStoreBuilder, LoadedIndex};
