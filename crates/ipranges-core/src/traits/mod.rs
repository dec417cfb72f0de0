//! Core traits for the ipranges system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`RangeSource`]: Fetch the authoritative document
//! - [`SnapshotStore`]: Persist and read back the cached document

pub mod range_source;
pub mod snapshot_store;

pub use range_source::{RangeSource, RangeSourceFactory};
pub use snapshot_store::SnapshotStore;
