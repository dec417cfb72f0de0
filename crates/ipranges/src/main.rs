// # ipranges - AWS IP ranges query tool
//
// Thin integration layer over ipranges-core. The tool:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Registers range sources and loads the dataset through the cache
// 4. Runs one filter query and prints the result as JSON
//
// Cache and filter semantics live in ipranges-core; nothing here decides
// freshness or matching.
//
// ## Configuration
//
// ### Cache
// - `IPRANGES_CACHE_FILE`: Snapshot path (default `$HOME/.aws/ip-ranges.json`)
// - `IPRANGES_EXPIRATION`: Duration such as `720h`; empty never expires (default `24h`)
//
// ### Source
// - `IPRANGES_SOURCE_TYPE`: Type of range source (http, file)
// - `IPRANGES_SOURCE_URL`: Document URL (for http)
// - `IPRANGES_SOURCE_PATH`: Mirrored document path (for file)
// - `IPRANGES_SOURCE_TIMEOUT_SECS`: Request timeout in seconds (for http)
//
// ### Query
// - `IPRANGES_FILTERS`: JSON array of `{"type": ..., "values": [...]}` criteria
// - `IPRANGES_CONTAINS`: IP address to test against every range
//
// ## Example
//
// ```bash
// export IPRANGES_EXPIRATION=720h
// export IPRANGES_FILTERS='[{"type":"region","values":["us-east-1"]},{"type":"service","values":["S3"]}]'
//
// ipranges > s3-us-east-1.json
// ```

use anyhow::Result;
use ipranges_core::config::{DEFAULT_EXPIRATION, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_SOURCE_URL};
use ipranges_core::filter::FilterSpec;
use ipranges_core::{
    CacheManager, Entry, FileSnapshotStore, Filter, RangesConfig, RangesQuery, SourceConfig,
    SourceRegistry,
};
use serde::Serialize;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum IprangesExitCode {
    /// Query completed and output was written
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Load or filter failure
    RuntimeError = 2,
}

impl From<IprangesExitCode> for ExitCode {
    fn from(code: IprangesExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    cache_file: Option<String>,
    expiration: String,
    source_type: String,
    source_url: Option<String>,
    source_path: Option<String>,
    source_timeout_secs: Option<u64>,
    filters: Vec<FilterSpec>,
    contains: Option<IpAddr>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let source_timeout_secs = match env::var("IPRANGES_SOURCE_TIMEOUT_SECS") {
            Ok(value) => Some(value.trim().parse().map_err(|_| {
                anyhow::anyhow!(
                    "IPRANGES_SOURCE_TIMEOUT_SECS must be a whole number of seconds. Got: {}",
                    value
                )
            })?),
            Err(_) => None,
        };

        let filters = match env::var("IPRANGES_FILTERS") {
            Ok(json) if !json.trim().is_empty() => serde_json::from_str(&json).map_err(|e| {
                anyhow::anyhow!(
                    "IPRANGES_FILTERS must be a JSON array of {{\"type\", \"values\"}} objects: {}",
                    e
                )
            })?,
            _ => Vec::new(),
        };

        let contains = match env::var("IPRANGES_CONTAINS") {
            Ok(value) => Some(value.trim().parse().map_err(|_| {
                anyhow::anyhow!("IPRANGES_CONTAINS must be an IP address. Got: {}", value)
            })?),
            Err(_) => None,
        };

        Ok(Self {
            cache_file: env::var("IPRANGES_CACHE_FILE").ok(),
            // Set-but-empty is meaningful: never expire
            expiration: env::var("IPRANGES_EXPIRATION")
                .unwrap_or_else(|_| DEFAULT_EXPIRATION.to_string()),
            source_type: env::var("IPRANGES_SOURCE_TYPE").unwrap_or_else(|_| "http".to_string()),
            source_url: env::var("IPRANGES_SOURCE_URL").ok(),
            source_path: env::var("IPRANGES_SOURCE_PATH").ok(),
            source_timeout_secs,
            filters,
            contains,
            log_level: env::var("IPRANGES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.source_type.as_str() {
            "http" | "file" => {}
            _ => anyhow::bail!(
                "IPRANGES_SOURCE_TYPE '{}' is not supported. \
                Supported types: http, file",
                self.source_type
            ),
        }

        if self.source_type == "file" && self.source_path.as_ref().is_none_or(|p| p.is_empty()) {
            anyhow::bail!(
                "IPRANGES_SOURCE_PATH is required when IPRANGES_SOURCE_TYPE=file. \
                Set it via: export IPRANGES_SOURCE_PATH=/srv/mirror/ip-ranges.json"
            );
        }

        if let Some(timeout) = self.source_timeout_secs
            && !(1..=300).contains(&timeout)
        {
            anyhow::bail!(
                "IPRANGES_SOURCE_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                timeout
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "IPRANGES_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.ranges_config().validate()?;
        Ok(())
    }

    /// Library configuration built from the environment
    fn ranges_config(&self) -> RangesConfig {
        let mut config = RangesConfig::new();

        config.source = match self.source_type.as_str() {
            "file" => SourceConfig::File {
                path: PathBuf::from(self.source_path.clone().unwrap_or_default()),
            },
            _ => SourceConfig::Http {
                url: self
                    .source_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                timeout_secs: self
                    .source_timeout_secs
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            },
        };

        config.cache.path = self.cache_file.as_ref().map(PathBuf::from);
        config.cache.expiration = self.expiration.clone();
        config
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Query result written to stdout
#[derive(Debug, Serialize)]
struct QueryOutput {
    create_date: String,
    sync_token: String,
    ip_prefixes: Vec<Entry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contains: Option<bool>,
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return IprangesExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IprangesExitCode::ConfigError.into();
    }

    // stdout carries the query result, so logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IprangesExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IprangesExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_query(&config).await {
            error!("Query failed: {}", e);
            IprangesExitCode::RuntimeError
        } else {
            IprangesExitCode::Success
        }
    });

    result.into()
}

/// Load the dataset, evaluate the configured query and print the result
async fn run_query(config: &Config) -> Result<()> {
    let output = query(config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn query(config: &Config) -> Result<QueryOutput> {
    let ranges_config = config.ranges_config();

    let registry = SourceRegistry::with_builtin();

    #[cfg(feature = "http")]
    ipranges_source_http::register(&registry);

    debug!("Registered range sources: {:?}", registry.list_sources());

    let source = registry.create_source(&ranges_config.source)?;
    let cache_path = ranges_config.cache.resolve_path()?;
    let expiration = ranges_config.cache.expiration_policy()?;

    info!(
        "Loading ranges from {} source (cache {}, expiration {})",
        source.source_name(),
        cache_path.display(),
        expiration
    );

    let manager = CacheManager::new(
        source,
        Box::new(FileSnapshotStore::new(&cache_path)),
        expiration,
    );
    let loaded = manager.load().await?;
    info!(
        "Loaded {} ranges ({}, created {})",
        loaded.dataset.len(),
        loaded.origin,
        loaded.dataset.create_date()
    );

    let query = RangesQuery::new(loaded.dataset);

    let filters = config
        .filters
        .iter()
        .cloned()
        .map(FilterSpec::into_filter)
        .collect::<ipranges_core::Result<Vec<Filter>>>()?;

    let ip_prefixes = query.ranges(&filters)?;
    let contains = config.contains.map(|ip| query.contains(ip)).transpose()?;

    info!("{} range(s) matched", ip_prefixes.len());

    Ok(QueryOutput {
        create_date: query.dataset().create_date().to_string(),
        sync_token: query.dataset().sync_token().to_string(),
        ip_prefixes,
        contains,
    })
}
