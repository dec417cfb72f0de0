// # HTTP Range Source
//
// This crate provides the HTTP range source for the ipranges registry.
//
// ## Purpose
//
// This is the **primary range source**: it downloads the published
// `ip-ranges.json` document from its public URL. Mirrors reachable over
// HTTP(S) work the same way.
//
// ## Limits
//
// Requests carry a timeout (30 seconds unless configured) and the response
// body is capped at 64 MiB. A non-success status is a fetch error; the body
// of an error response is never handed to the parser.

use ipranges_core::SourceRegistry;
use ipranges_core::config::{DEFAULT_FETCH_TIMEOUT_SECS, SourceConfig};
use ipranges_core::traits::{RangeSource, RangeSourceFactory};
use ipranges_core::{Error, Result};

use std::time::Duration;

/// Maximum accepted response size: 64 MiB
const MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024;

/// Name used in errors and logs
const SOURCE_NAME: &str = "http";

/// HTTP range source
pub struct HttpRangeSource {
    /// Document URL
    url: String,

    /// HTTP client
    client: reqwest::Client,

    /// Response size cap
    max_bytes: usize,
}

impl HttpRangeSource {
    /// Create a new HTTP range source with the default timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ipranges/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("HTTP client init failed: {}", e)))?;

        Ok(Self::with_client(url, client))
    }

    /// Create with a preconfigured client
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
            max_bytes: MAX_RESPONSE_SIZE,
        }
    }

    /// Override the response size cap
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Document URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl RangeSource for HttpRangeSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tracing::debug!("Fetching ranges from {}", self.url);

        let mut response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::fetch(SOURCE_NAME, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::fetch(
                SOURCE_NAME,
                format!("HTTP error: {}", response.status()),
            ));
        }

        // Saturates on 32-bit, which the cap then rejects
        let content_length: usize = response
            .content_length()
            .unwrap_or(0)
            .try_into()
            .unwrap_or(usize::MAX);

        if content_length > self.max_bytes {
            return Err(Error::fetch(
                SOURCE_NAME,
                format!(
                    "Response too large: {} bytes (max {} bytes)",
                    content_length, self.max_bytes
                ),
            ));
        }

        let mut body = Vec::with_capacity(content_length);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::fetch(SOURCE_NAME, format!("Failed to read response: {}", e)))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(Error::fetch(
                    SOURCE_NAME,
                    format!("Response exceeded {} byte limit", self.max_bytes),
                ));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn source_name(&self) -> &str {
        SOURCE_NAME
    }
}

/// Factory for creating HTTP range sources
pub struct HttpSourceFactory;

impl RangeSourceFactory for HttpSourceFactory {
    fn create(&self, config: &SourceConfig) -> Result<Box<dyn RangeSource>> {
        match config {
            SourceConfig::Http { url, timeout_secs } => Ok(Box::new(
                HttpRangeSource::with_timeout(url.clone(), Duration::from_secs(*timeout_secs))?,
            )),
            _ => Err(Error::config("Invalid config for HTTP range source")),
        }
    }
}

/// Register the HTTP range source with a registry
pub fn register(registry: &SourceRegistry) {
    registry.register_source(SOURCE_NAME, Box::new(HttpSourceFactory));
}
