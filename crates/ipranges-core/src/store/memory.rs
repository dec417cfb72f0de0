// # Memory Snapshot Store
//
// In-memory implementation of SnapshotStore.
//
// Useful for tests and for embedding the library where the dataset should
// live only as long as the process. Clones share the same snapshot.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::snapshot_store::SnapshotStore;

/// In-memory snapshot store
///
/// # Example
///
/// ```rust
/// use ipranges_core::store::MemorySnapshotStore;
/// use ipranges_core::traits::SnapshotStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySnapshotStore::new();
///     assert!(store.read().await?.is_none());
///
///     store.write(b"{}").await?;
///     assert_eq!(store.read().await?.as_deref(), Some(&b"{}"[..]));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<RwLock<Option<Vec<u8>>>>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a snapshot
    pub fn with_snapshot(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(bytes.into()))),
        }
    }

    /// Current snapshot, if any
    pub async fn snapshot(&self) -> Option<Vec<u8>> {
        self.inner.read().await.clone()
    }

    /// Drop the stored snapshot
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn read(&self) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), Error> {
        *self.inner.write().await = Some(bytes.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
