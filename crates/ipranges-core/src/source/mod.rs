// # Built-in Range Sources
//
// Sources that need nothing beyond the core crate. Network sources live in
// their own crates (see `ipranges-source-http`).

pub mod file;

pub use file::{FileRangeSource, FileSourceFactory};
