//! Configuration types for the ipranges system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Published location of the AWS IP ranges document
pub const DEFAULT_SOURCE_URL: &str = "https://ip-ranges.amazonaws.com/ip-ranges.json";

/// Cache location relative to the user's home directory
pub const DEFAULT_CACHE_RELATIVE_PATH: &str = ".aws/ip-ranges.json";

/// Default expiration applied when none is configured
pub const DEFAULT_EXPIRATION: &str = "24h";

/// Default HTTP fetch timeout
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Main ipranges configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangesConfig {
    /// Where authoritative data comes from
    #[serde(default)]
    pub source: SourceConfig,

    /// Local snapshot settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl RangesConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

/// Range source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Fetch the published document over HTTP(S)
    Http {
        /// Document URL
        url: String,
        /// Request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Read an already mirrored document from disk
    File {
        /// Path to the mirrored document
        path: PathBuf,
    },

    /// Custom range source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            SourceConfig::Http { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(Error::config("HTTP source URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(Error::config(format!(
                        "HTTP source URL must use http or https: {}",
                        url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(Error::config("HTTP source timeout must be > 0"));
                }
                Ok(())
            }
            SourceConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    return Err(Error::config("File source path cannot be empty"));
                }
                Ok(())
            }
            SourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("Custom source factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("Custom source config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Registry name of the source type
    pub fn type_name(&self) -> &str {
        match self {
            SourceConfig::Http { .. } => "http",
            SourceConfig::File { .. } => "file",
            SourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Http {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

/// Local snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Snapshot path; `None` selects the home-directory default
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Expiration as a duration string (`"720h"`); empty means never expire
    #[serde(default = "default_expiration")]
    pub expiration: String,
}

impl CacheConfig {
    /// Validate the cache configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.path
            && path.as_os_str().is_empty()
        {
            return Err(Error::config("Cache path cannot be empty"));
        }
        self.expiration_policy()?;
        Ok(())
    }

    /// Parsed expiration policy
    pub fn expiration_policy(&self) -> Result<ExpirationPolicy> {
        self.expiration.parse()
    }

    /// Resolved snapshot path
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => default_cache_path(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            expiration: default_expiration(),
        }
    }
}

fn default_expiration() -> String {
    DEFAULT_EXPIRATION.to_string()
}

/// Default snapshot path under the executing user's home directory
pub fn default_cache_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CACHE_RELATIVE_PATH))
        .ok_or_else(|| Error::config("Could not determine home directory for the cache file"))
}

/// How long a cached dataset stays fresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpirationPolicy {
    /// Cached data is always fresh
    #[default]
    Never,
    /// Cached data is fresh while younger than this
    After(Duration),
}

impl ExpirationPolicy {
    /// Whether a dataset of the given age is still fresh
    ///
    /// Negative ages (timestamps in the future) count as fresh.
    pub fn is_fresh(&self, age: chrono::Duration) -> bool {
        match self {
            ExpirationPolicy::Never => true,
            ExpirationPolicy::After(max_age) => match chrono::Duration::from_std(*max_age) {
                Ok(max_age) => age < max_age,
                // Longer than chrono can represent
                Err(_) => true,
            },
        }
    }
}

impl FromStr for ExpirationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(ExpirationPolicy::Never);
        }
        parse_duration(s).map(ExpirationPolicy::After)
    }
}

impl fmt::Display for ExpirationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpirationPolicy::Never => write!(f, "never"),
            ExpirationPolicy::After(d) => write!(f, "{:?}", d),
        }
    }
}

/// Parse a duration string such as `720h`, `1h30m`, `1.5h` or `250ms`
///
/// Accepted units: `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`. A bare `0` is
/// accepted; any other number must carry a unit. Signs are rejected.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = |msg: &str| Error::invalid_expiration(input, msg);

    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut rest = input;
    let mut total_nanos: f64 = 0.0;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        if number.is_empty() || number == "." {
            return Err(invalid("expected a number"));
        }
        let value: f64 = number.parse().map_err(|_| invalid("malformed number"))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid(&format!("unknown unit '{}'", unit))),
        };
        rest = &rest[unit_len..];

        total_nanos += value * scale;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid("duration out of range"));
    }

    Ok(Duration::from_nanos(total_nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("720h").unwrap(), Duration::from_secs(720 * 3600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        for bad in ["720", "h", "-1h", "1d", "1h30", "abc", "1..5h"] {
            assert!(
                matches!(parse_duration(bad), Err(Error::InvalidExpiration { .. })),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_empty_expiration_means_never() {
        let policy: ExpirationPolicy = "".parse().unwrap();
        assert_eq!(policy, ExpirationPolicy::Never);
        assert!(policy.is_fresh(chrono::Duration::days(10_000)));
    }

    #[test]
    fn test_expiration_freshness_boundary() {
        let policy: ExpirationPolicy = "1h".parse().unwrap();
        assert!(policy.is_fresh(chrono::Duration::minutes(59)));
        assert!(!policy.is_fresh(chrono::Duration::hours(1)));
        assert!(!policy.is_fresh(chrono::Duration::hours(2)));
        assert!(policy.is_fresh(chrono::Duration::hours(-1)));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = RangesConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.type_name(), "http");
        assert_eq!(
            config.cache.expiration_policy().unwrap(),
            ExpirationPolicy::After(Duration::from_secs(24 * 3600))
        );
    }

    #[test]
    fn test_config_validation() {
        let config = SourceConfig::Http {
            url: "ftp://example.com/ip-ranges.json".to_string(),
            timeout_secs: 30,
        };
        assert!(config.validate().is_err());

        let config = SourceConfig::File {
            path: PathBuf::new(),
        };
        assert!(config.validate().is_err());

        let cache = CacheConfig {
            path: None,
            expiration: "forever".to_string(),
        };
        assert!(cache.validate().is_err());
    }

    #[test]
    fn test_source_config_deserializes_tagged() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"type": "file", "path": "/tmp/ip-ranges.json"}"#).unwrap();
        assert_eq!(config.type_name(), "file");

        let config: SourceConfig =
            serde_json::from_str(r#"{"type": "http", "url": "https://example.com/r.json"}"#)
                .unwrap();
        match config {
            SourceConfig::Http { timeout_secs, .. } => {
                assert_eq!(timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS)
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_explicit_cache_path_wins() {
        let cache = CacheConfig {
            path: Some(PathBuf::from("/var/cache/ip-ranges.json")),
            expiration: String::new(),
        };
        assert_eq!(
            cache.resolve_path().unwrap(),
            PathBuf::from("/var/cache/ip-ranges.json")
        );
    }
}
