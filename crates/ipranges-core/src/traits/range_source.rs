// # Range Source Trait
//
// Defines the interface for fetching the authoritative IP ranges document.
//
// ## Implementations
//
// - HTTP: `ipranges-source-http` crate
// - Local mirror: [`crate::source::FileRangeSource`]
//
// ## Usage
//
// ```rust,ignore
// use ipranges_core::RangeSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* RangeSource implementation */;
//
//     let bytes = source.fetch().await?;
//     println!("fetched {} bytes from {}", bytes.len(), source.source_name());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for range source implementations
///
/// A range source is an opaque producer of the raw published document. It
/// does not parse, cache or retry; those decisions belong to
/// [`crate::CacheManager`].
///
/// # Errors
///
/// Any failure, including transport timeouts, must surface as
/// [`crate::Error::Fetch`].
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Fetch the raw document bytes
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<u8>)`: The unparsed document
    /// - `Err(Error)`: The source could not be reached or read
    async fn fetch(&self) -> Result<Vec<u8>, crate::Error>;

    /// Short name used in logs and error messages
    fn source_name(&self) -> &str;
}

/// Helper trait for constructing range sources from configuration
pub trait RangeSourceFactory: Send + Sync {
    /// Create a RangeSource instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this source type
    ///
    /// # Returns
    ///
    /// A boxed RangeSource trait object
    fn create(
        &self,
        config: &crate::config::SourceConfig,
    ) -> Result<Box<dyn RangeSource>, crate::Error>;
}
