//! Shared query context
//!
//! A [`RangesQuery`] is built once from a loaded dataset and handed to every
//! query handler. It is cheap to clone and never mutated; a refresh builds a
//! new one.

use std::net::IpAddr;
use std::sync::Arc;

use crate::dataset::{Dataset, Entry};
use crate::error::Result;
use crate::filter::{self, Filter, FilterType};

/// Immutable handle on one loaded dataset
#[derive(Debug, Clone)]
pub struct RangesQuery {
    dataset: Arc<Dataset>,
}

impl RangesQuery {
    /// Wrap a loaded dataset
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }

    /// The underlying dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Entries matching every filter, in dataset order
    pub fn ranges(&self, filters: &[Filter]) -> Result<Vec<Entry>> {
        Ok(filter::evaluate(&self.dataset, filters)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Whether any range contains `ip`
    pub fn contains(&self, ip: IpAddr) -> Result<bool> {
        let filters = [Filter::single(FilterType::Address, ip.to_string())];
        Ok(!filter::evaluate(&self.dataset, &filters)?.is_empty())
    }
}

impl From<Dataset> for RangesQuery {
    fn from(dataset: Dataset) -> Self {
        Self::new(dataset)
    }
}
