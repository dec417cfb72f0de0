//! Dataset cache manager
//!
//! The CacheManager is responsible for:
//! - Reading the cached snapshot from a SnapshotStore
//! - Deciding whether the snapshot is fresh enough to use
//! - Fetching from the RangeSource when it is not
//! - Writing fetched data back to the store (best-effort)
//!
//! ## Load Flow
//!
//! ```text
//!  SnapshotStore::read ──► Dataset::from_slice ──► created_at / freshness
//!        │ miss                  │ miss                 │ stale     │ fresh
//!        └───────────────────────┴──────────────────────┘           ▼
//!                                │                            return cached
//!                                ▼
//!                      RangeSource::fetch ──► parse ──► SnapshotStore::write
//!                                                            (best-effort)
//!                                                                 │
//!                                                                 ▼
//!                                                          return fetched
//! ```
//!
//! ## Failure Policy
//!
//! | condition                         | outcome                      |
//! |-----------------------------------|------------------------------|
//! | snapshot missing or unreadable    | cache miss, fetch            |
//! | snapshot not a valid document     | cache miss, fetch            |
//! | snapshot timestamp unparseable    | error, no fetch              |
//! | fetch fails                       | error                        |
//! | fetched data malformed            | error                        |
//! | write-back fails                  | logged, fetched data returned|
//!
//! There are no retries: each call fetches at most once.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

use crate::config::ExpirationPolicy;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::store::FileSnapshotStore;
use crate::traits::{RangeSource, SnapshotStore};
use tracing::{debug, info, warn};

/// Where a loaded dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetOrigin {
    /// Served from a fresh cached snapshot
    Cache,
    /// Fetched from the range source
    Fetched,
}

impl fmt::Display for DatasetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetOrigin::Cache => f.write_str("cache"),
            DatasetOrigin::Fetched => f.write_str("fetched"),
        }
    }
}

/// A dataset together with the path that produced it
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    /// The loaded dataset
    pub dataset: Dataset,
    /// Which path served it
    pub origin: DatasetOrigin,
}

/// Result of looking at the cached snapshot
enum CacheLookup {
    Fresh(Dataset),
    Stale,
    Miss(String),
}

/// Dataset cache manager
///
/// Holds no dataset itself: every load reads the store again, so independent
/// managers (or processes) pointed at the same store behave consistently.
///
/// ## Example
///
/// ```rust,ignore
/// use ipranges_core::{CacheManager, FileSnapshotStore, FileRangeSource};
///
/// let manager = CacheManager::new(
///     Box::new(FileRangeSource::new("/srv/mirror/ip-ranges.json")),
///     Box::new(FileSnapshotStore::new("/var/cache/ip-ranges.json")),
///     "720h".parse()?,
/// );
/// let dataset = manager.load_dataset().await?;
/// ```
pub struct CacheManager {
    /// Authoritative data
    source: Box<dyn RangeSource>,

    /// Cached snapshot
    store: Box<dyn SnapshotStore>,

    /// Freshness window
    expiration: ExpirationPolicy,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(
        source: Box<dyn RangeSource>,
        store: Box<dyn SnapshotStore>,
        expiration: ExpirationPolicy,
    ) -> Self {
        Self {
            source,
            store,
            expiration,
        }
    }

    /// Configured expiration policy
    pub fn expiration(&self) -> ExpirationPolicy {
        self.expiration
    }

    /// Load the current dataset
    pub async fn load_dataset(&self) -> Result<Dataset> {
        self.load().await.map(|loaded| loaded.dataset)
    }

    /// Load the current dataset, reporting where it came from
    pub async fn load(&self) -> Result<LoadedDataset> {
        self.load_at(Utc::now()).await
    }

    /// Load the current dataset, judging freshness as of `now`
    pub async fn load_at(&self, now: DateTime<Utc>) -> Result<LoadedDataset> {
        match self.lookup_cache(now).await? {
            CacheLookup::Fresh(dataset) => {
                debug!(
                    "Using cached ranges from {} (created {})",
                    self.store.location(),
                    dataset.create_date()
                );
                return Ok(LoadedDataset {
                    dataset,
                    origin: DatasetOrigin::Cache,
                });
            }
            CacheLookup::Stale => {
                info!(
                    "Cached ranges at {} are older than {}, refreshing",
                    self.store.location(),
                    self.expiration
                );
            }
            CacheLookup::Miss(reason) => {
                info!("Cache miss ({}), fetching ranges", reason);
            }
        }

        let dataset = self.refresh().await?;
        Ok(LoadedDataset {
            dataset,
            origin: DatasetOrigin::Fetched,
        })
    }

    /// Inspect the cached snapshot
    ///
    /// Only a corrupt timestamp escapes as an error; everything else that
    /// makes the snapshot unusable is a miss.
    async fn lookup_cache(&self, now: DateTime<Utc>) -> Result<CacheLookup> {
        let bytes = match self.store.read().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(CacheLookup::Miss("no cached snapshot".to_string())),
            Err(e) => {
                warn!("Ignoring unreadable cache: {}", e);
                return Ok(CacheLookup::Miss("cache unreadable".to_string()));
            }
        };

        let dataset = match Dataset::from_slice(&bytes) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!(
                    "Ignoring cached snapshot at {} that does not parse: {}",
                    self.store.location(),
                    e
                );
                return Ok(CacheLookup::Miss("cache unparseable".to_string()));
            }
        };

        let created = dataset.created_at()?;

        if self.expiration.is_fresh(now.signed_duration_since(created)) {
            Ok(CacheLookup::Fresh(dataset))
        } else {
            Ok(CacheLookup::Stale)
        }
    }

    /// Fetch, validate and persist a new snapshot
    async fn refresh(&self) -> Result<Dataset> {
        let bytes = self.source.fetch().await?;
        debug!(
            "Fetched {} bytes from {} source",
            bytes.len(),
            self.source.source_name()
        );

        // Validated before write-back so a bad document never reaches the cache
        let dataset = Dataset::from_slice(&bytes)
            .and_then(|dataset| dataset.created_at().map(|_| dataset))
            .map_err(|e| {
                Error::malformed_data(format!(
                    "{} source returned an invalid document: {}",
                    self.source.source_name(),
                    e
                ))
            })?;

        if let Err(e) = self.store.write(&bytes).await {
            warn!(
                "Failed to cache ranges at {}, continuing with fetched data: {}",
                self.store.location(),
                e
            );
        }

        info!(
            "Loaded {} ranges created {}",
            dataset.len(),
            dataset.create_date()
        );
        Ok(dataset)
    }
}

/// Load a dataset using a file cache at `cache_path`
///
/// `expiration` is a duration string such as `"720h"`; an empty string
/// never expires. An unparseable expiration is an error.
pub async fn load_dataset(
    cache_path: impl AsRef<Path>,
    expiration: &str,
    source: Box<dyn RangeSource>,
) -> Result<Dataset> {
    let expiration: ExpirationPolicy = expiration.parse()?;
    CacheManager::new(
        source,
        Box::new(FileSnapshotStore::new(cache_path)),
        expiration,
    )
    .load_dataset()
    .await
}
