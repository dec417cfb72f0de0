//! Test doubles and fixtures for contract tests
//!
//! The doubles count calls so tests can assert not only what a load
//! returned but how many times it went to the source.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use ipranges_core::dataset::format_create_date;
use ipranges_core::error::{Error, Result};
use ipranges_core::traits::{RangeSource, SnapshotStore};
use ipranges_core::{Dataset, MemorySnapshotStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixture ranges: (prefix, region, network border group, service)
pub const FIXTURE_IPV4: &[(&str, &str, &str, &str)] = &[
    ("3.5.0.0/19", "us-east-1", "us-east-1", "AMAZON"),
    ("3.5.0.0/19", "us-east-1", "us-east-1", "S3"),
    ("3.5.12.0/22", "us-east-1", "us-east-1", "EC2"),
    ("52.94.0.0/22", "us-east-1", "us-east-1", "DYNAMODB"),
    ("52.94.24.0/23", "us-west-2", "us-west-2", "DYNAMODB"),
    ("3.2.34.0/26", "af-south-1", "af-south-1", "AMAZON"),
    ("15.230.56.104/31", "us-east-1", "us-east-1-bue-1", "AMAZON"),
];

/// Fixture IPv6 ranges, folded in after the IPv4 ones
pub const FIXTURE_IPV6: &[(&str, &str, &str, &str)] = &[
    ("2600:1f18::/33", "us-east-1", "us-east-1", "EC2"),
    ("2a05:d07a:a000::/40", "eu-south-1", "eu-south-1", "S3"),
];

/// Build a published-format document
pub fn document(sync_token: &str, create_date: &str) -> String {
    let prefixes: Vec<serde_json::Value> = FIXTURE_IPV4
        .iter()
        .map(|(prefix, region, nbg, service)| {
            serde_json::json!({
                "ip_prefix": prefix,
                "region": region,
                "network_border_group": nbg,
                "service": service,
            })
        })
        .collect();
    let ipv6_prefixes: Vec<serde_json::Value> = FIXTURE_IPV6
        .iter()
        .map(|(prefix, region, nbg, service)| {
            serde_json::json!({
                "ipv6_prefix": prefix,
                "region": region,
                "network_border_group": nbg,
                "service": service,
            })
        })
        .collect();

    serde_json::json!({
        "syncToken": sync_token,
        "createDate": create_date,
        "prefixes": prefixes,
        "ipv6_prefixes": ipv6_prefixes,
    })
    .to_string()
}

/// Document created `hours` ago
pub fn document_aged(sync_token: &str, hours: i64) -> String {
    document(sync_token, &create_date_hours_ago(hours))
}

/// `createDate` value for `hours` before now
pub fn create_date_hours_ago(hours: i64) -> String {
    format_create_date(Utc::now() - Duration::hours(hours))
}

/// The fixture as a loaded dataset
pub fn fixture_dataset() -> Dataset {
    Dataset::from_slice(document("fixture", "2024-01-15-20-13-07").as_bytes())
        .expect("fixture document parses")
}

/// A range source that returns a canned response and counts fetches
pub struct CountingSource {
    response: std::result::Result<String, String>,
    fetch_count: Arc<AtomicUsize>,
}

impl CountingSource {
    /// Source that always succeeds with `body`
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            response: Ok(body.into()),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Source that always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle on the fetch counter, usable after the source is boxed
    pub fn counter(&self) -> FetchCounter {
        FetchCounter(Arc::clone(&self.fetch_count))
    }
}

#[async_trait::async_trait]
impl RangeSource for CountingSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(body) => Ok(body.clone().into_bytes()),
            Err(message) => Err(Error::fetch("counting", message.clone())),
        }
    }

    fn source_name(&self) -> &str {
        "counting"
    }
}

/// Shared view of a CountingSource's fetch count
#[derive(Clone)]
pub struct FetchCounter(Arc<AtomicUsize>);

impl FetchCounter {
    /// Number of fetches so far
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A store whose reads fail as if the file were unreadable
pub struct UnreadableStore {
    inner: MemorySnapshotStore,
}

impl UnreadableStore {
    pub fn new() -> (Self, MemorySnapshotStore) {
        let inner = MemorySnapshotStore::new();
        (
            Self {
                inner: inner.clone(),
            },
            inner,
        )
    }
}

#[async_trait::async_trait]
impl SnapshotStore for UnreadableStore {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        Err(Error::cache_read("permission denied"))
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        self.inner.write(bytes).await
    }

    fn location(&self) -> String {
        "unreadable".to_string()
    }
}

/// A store that serves a fixed snapshot but rejects every write
pub struct ReadOnlyStore {
    snapshot: Option<Vec<u8>>,
    write_attempts: Arc<AtomicUsize>,
}

impl ReadOnlyStore {
    pub fn new(snapshot: Option<&str>) -> Self {
        Self {
            snapshot: snapshot.map(|s| s.as_bytes().to_vec()),
            write_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle on the write attempt counter
    pub fn write_attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.write_attempts)
    }
}

#[async_trait::async_trait]
impl SnapshotStore for ReadOnlyStore {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot.clone())
    }

    async fn write(&self, _bytes: &[u8]) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::cache_write("read-only file system"))
    }

    fn location(&self) -> String {
        "read-only".to_string()
    }
}
