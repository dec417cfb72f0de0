// # File Range Source
//
// Reads an already mirrored copy of the published document from disk.
//
// ## Purpose
//
// - Air-gapped hosts that receive the document out of band
// - CI and local testing without network access
//
// This is not the snapshot cache: the mirror is treated as the
// authoritative source, so failing to read it is a fetch failure.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::registry::SourceRegistry;
use crate::traits::{RangeSource, RangeSourceFactory};

/// Range source backed by a local file
#[derive(Debug, Clone)]
pub struct FileRangeSource {
    path: PathBuf,
}

impl FileRangeSource {
    /// Create a source reading from the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RangeSource for FileRangeSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::debug!("Reading ranges from mirror {}", self.path.display());
        fs::read(&self.path).await.map_err(|e| {
            Error::fetch(
                "file",
                format!("Failed to read {}: {}", self.path.display(), e),
            )
        })
    }

    fn source_name(&self) -> &str {
        "file"
    }
}

/// Factory for creating file range sources
pub struct FileSourceFactory;

impl RangeSourceFactory for FileSourceFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn RangeSource>> {
        match config {
            SourceConfig::File { path } => Ok(Box::new(FileRangeSource::new(path))),
            _ => Err(Error::config("Invalid config for file range source")),
        }
    }
}

/// Register the file range source with a registry
pub fn register(registry: &SourceRegistry) {
    registry.register_source("file", Box::new(FileSourceFactory));
}
