// # File Snapshot Store
//
// File-based implementation of SnapshotStore.
//
// ## Atomic Writes
//
// Every write goes to a uniquely named temporary file next to the target,
// is flushed and synced, then renamed over the target. Readers see either
// the previous snapshot or the new one, never a torn file. Two processes
// refreshing at the same time each rename their own complete file; the
// last rename wins.
//
// ## Missing vs Unreadable
//
// A missing file is reported as `Ok(None)`. Any other read failure
// (permissions, a directory in the way) is an error; the cache manager
// treats both as a cache miss but logs them differently.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::snapshot_store::SnapshotStore;

/// Distinguishes temp files written by concurrent tasks of one process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-based snapshot store
///
/// # Example
///
/// ```rust,no_run
/// use ipranges_core::store::FileSnapshotStore;
/// use ipranges_core::traits::SnapshotStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSnapshotStore::new("/var/cache/ipranges/ip-ranges.json");
///
///     store.write(br#"{"createDate": "2024-01-15-20-13-07", "prefixes": []}"#).await?;
///     assert!(store.read().await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store backed by the given path
    ///
    /// Nothing is touched on disk until the first read or write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a fresh temporary path next to the snapshot
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.path.with_file_name(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            unique
        ))
    }

    async fn write_temp(temp_path: &Path, bytes: &[u8]) -> Result<(), Error> {
        let mut file = fs::File::create(temp_path).await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.write_all(bytes).await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to write to temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to flush temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to sync temp file {}: {}",
                temp_path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn read(&self) -> Result<Option<Vec<u8>>, Error> {
        match fs::read(&self.path).await {
            Ok(bytes) => {
                tracing::trace!("Read {} bytes from {}", bytes.len(), self.path.display());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Snapshot file does not exist: {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(Error::cache_read(format!(
                "Failed to read snapshot file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::cache_write(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = Self::write_temp(&temp_path, bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        // Atomic rename (temp -> actual)
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::cache_write(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            )));
        }

        tracing::trace!("Snapshot written to file: {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
