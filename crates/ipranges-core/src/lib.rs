// # ipranges-core
//
// Core library for the cached AWS IP ranges registry.
//
// ## Architecture Overview
//
// - **RangeSource**: Trait for fetching the authoritative document
// - **SnapshotStore**: Trait for the locally cached copy
// - **CacheManager**: Decides between cached and fetched data on every load
// - **filter**: Evaluates filter queries against a loaded dataset
// - **RangesQuery**: Immutable shared handle on one loaded dataset
// - **SourceRegistry**: Plugin-based registry for range sources
//
// ## Design Principles
//
// 1. **Cache as optimization**: Returned data never depends on a cache write
// 2. **Loud corruption**: A corrupt cached timestamp is reported, not refetched over
// 3. **Immutable datasets**: A refresh replaces the dataset, never edits it
// 4. **Library-First**: The binary is a thin layer over this crate

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod query;
pub mod registry;
pub mod source;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use cache::{CacheManager, DatasetOrigin, LoadedDataset, load_dataset};
pub use config::{CacheConfig, ExpirationPolicy, RangesConfig, SourceConfig};
pub use dataset::{Dataset, Entry};
pub use error::{Error, Result};
pub use filter::{Filter, FilterSpec, FilterType};
pub use query::RangesQuery;
pub use registry::SourceRegistry;
pub use source::FileRangeSource;
pub use store::{FileSnapshotStore, MemorySnapshotStore};
pub use traits::{RangeSource, RangeSourceFactory, SnapshotStore};
