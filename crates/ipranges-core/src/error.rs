//! Error types for the ipranges system
//!
//! This module defines all error types used throughout the crate.
//!
//! A cache miss is deliberately absent: it is an internal lookup outcome
//! handled by the cache manager, never something a caller sees.

use thiserror::Error;

/// Result type alias for ipranges operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ipranges system
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the cached snapshot failed for a reason other than absence
    #[error("Cache read error: {0}")]
    CacheRead(String),

    /// Persisting a freshly fetched snapshot failed
    #[error("Cache write error: {0}")]
    CacheWrite(String),

    /// The cached snapshot has a creation timestamp that does not parse
    #[error("Corrupt cache timestamp '{value}': {reason}")]
    CorruptTimestamp {
        /// Raw timestamp text
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The authoritative source could not be fetched
    #[error("Fetch error ({origin}): {message}")]
    Fetch {
        /// Name of the range source
        origin: String,
        /// Error message
        message: String,
    },

    /// Freshly fetched data could not be parsed
    #[error("Malformed fetched data: {0}")]
    MalformedData(String),

    /// Filter type outside the supported set
    #[error("Filter error: unknown filter type '{0}'")]
    UnknownFilterType(String),

    /// Filter value that cannot be interpreted for its type
    #[error("Filter error: malformed value for '{filter_type}': {message}")]
    MalformedFilterValue {
        /// Filter type the value was given for
        filter_type: String,
        /// Error message
        message: String,
    },

    /// Expiration duration that does not parse
    #[error("Invalid expiration '{value}': {message}")]
    InvalidExpiration {
        /// Raw duration text
        value: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a cache read error
    pub fn cache_read(msg: impl Into<String>) -> Self {
        Self::CacheRead(msg.into())
    }

    /// Create a cache write error
    pub fn cache_write(msg: impl Into<String>) -> Self {
        Self::CacheWrite(msg.into())
    }

    /// Create a corrupt timestamp error
    pub fn corrupt_timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptTimestamp {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a fetch error attributed to a range source
    pub fn fetch(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create a malformed data error
    pub fn malformed_data(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }

    /// Create an unknown filter type error
    pub fn unknown_filter_type(filter_type: impl Into<String>) -> Self {
        Self::UnknownFilterType(filter_type.into())
    }

    /// Create a malformed filter value error
    pub fn malformed_filter_value(
        filter_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedFilterValue {
            filter_type: filter_type.into(),
            message: message.into(),
        }
    }

    /// Create an invalid expiration error
    pub fn invalid_expiration(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidExpiration {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stage of the pipeline this error belongs to
    pub fn stage(&self) -> &'static str {
        match self {
            Self::CacheRead(_) | Self::Io(_) => "read",
            Self::CacheWrite(_) => "write",
            Self::CorruptTimestamp { .. } | Self::MalformedData(_) | Self::Json(_) => "parse",
            Self::Fetch { .. } => "fetch",
            Self::UnknownFilterType(_) | Self::MalformedFilterValue { .. } => "filter",
            Self::InvalidExpiration { .. } | Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
