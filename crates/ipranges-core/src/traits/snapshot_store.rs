// # Snapshot Store Trait
//
// Defines where the cached copy of the document lives.
//
// The store only moves bytes. Whether those bytes are fresh, and what to do
// when they are missing or unreadable, is decided by the cache manager.

use async_trait::async_trait;

/// Trait for snapshot store implementations
///
/// # Concurrency
///
/// Independent callers may read and write the same store concurrently.
/// Implementations must never let a reader observe a partially written
/// snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))`: A snapshot exists
    /// - `Ok(None)`: No snapshot has been stored
    /// - `Err(Error)`: The snapshot exists but could not be read
    async fn read(&self) -> Result<Option<Vec<u8>>, crate::Error>;

    /// Replace the stored snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The new snapshot is fully in place
    /// - `Err(Error)`: Nothing was replaced
    async fn write(&self, bytes: &[u8]) -> Result<(), crate::Error>;

    /// Human readable location, for logs
    fn location(&self) -> String;
}
