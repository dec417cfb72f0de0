//! Plugin-based range source registry
//!
//! The registry maps source type names to factories so that the binary can
//! build a [`RangeSource`] from configuration without a hardcoded match over
//! every implementation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ipranges_core::registry::SourceRegistry;
//! use ipranges_core::config::SourceConfig;
//!
//! let registry = SourceRegistry::with_builtin();
//! ipranges_source_http::register(&registry);
//!
//! let source = registry.create_source(&SourceConfig::default())?;
//! ```

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::traits::{RangeSource, RangeSourceFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Range source registry
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct SourceRegistry {
    sources: RwLock<HashMap<String, Box<dyn RangeSourceFactory>>>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the sources built into this crate
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        crate::source::file::register(&registry);
        registry
    }

    /// Register a range source factory
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn RangeSourceFactory>) {
        let name = name.into();
        tracing::debug!("Registering range source: {}", name);
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.insert(name, factory);
    }

    /// Create a range source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RangeSource>)`: Created source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_source(&self, config: &SourceConfig) -> Result<Box<dyn RangeSource>> {
        let source_type = config.type_name();
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown range source type: {}", source_type)))?;

        factory.create(config)
    }

    /// List all registered source types
    pub fn list_sources(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockSourceFactory;

    impl RangeSourceFactory for MockSourceFactory {
        fn create(&self, _config: &SourceConfig) -> Result<Box<dyn RangeSource>> {
            Err(Error::Other("Mock source not implemented".to_string()))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = SourceRegistry::new();

        assert!(!registry.has_source("mock"));

        registry.register_source("mock", Box::new(MockSourceFactory));

        assert!(registry.has_source("mock"));
        assert!(registry.list_sources().contains(&"mock".to_string()));
    }

    #[test]
    fn test_builtin_file_source() {
        let registry = SourceRegistry::with_builtin();
        assert_eq!(registry.list_sources(), vec!["file".to_string()]);

        let config = SourceConfig::File {
            path: "/tmp/ip-ranges.json".into(),
        };
        let source = registry.create_source(&config).unwrap();
        assert_eq!(source.source_name(), "file");
    }

    #[test]
    fn test_unknown_source_type() {
        let registry = SourceRegistry::with_builtin();

        let err = registry.create_source(&SourceConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("http"));
    }
}
