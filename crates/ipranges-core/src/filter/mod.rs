//! Filter evaluation over a loaded dataset
//!
//! A query is a list of [`Filter`]s. Each filter names one entry attribute
//! and a list of accepted values:
//!
//! - within a filter, an entry matches if **any** value matches (OR)
//! - across filters, an entry must match **every** filter (AND)
//! - comparisons ignore ASCII case
//! - an empty filter list selects every entry
//! - results keep dataset order
//!
//! Address filters take IP addresses and match every entry whose prefix
//! contains the address. A value in CIDR notation instead matches entries
//! whose network is exactly that CIDR.
//!
//! ```rust
//! use ipranges_core::{Dataset, Entry, Filter, FilterType, filter};
//!
//! let dataset = Dataset::new("1", "2024-01-15-20-13-07", vec![
//!     Entry::new("3.5.0.0/19", "us-east-1", "us-east-1", "S3"),
//!     Entry::new("52.94.0.0/22", "us-east-1", "us-east-1", "DYNAMODB"),
//! ]);
//!
//! let filters = vec![
//!     Filter::single(FilterType::Region, "US-EAST-1"),
//!     Filter::new(FilterType::Service, vec!["dynamodb".into(), "ec2".into()]),
//! ];
//!
//! let matches = filter::evaluate(&dataset, &filters).unwrap();
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].ip_prefix, "52.94.0.0/22");
//! ```

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::dataset::{Dataset, Entry};
use crate::error::{Error, Result};

/// Entry attribute a filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// Address containment on `ip_prefix`
    Address,
    /// `region`
    Region,
    /// `network_border_group`
    NetworkBorderGroup,
    /// `service`
    Service,
}

impl FilterType {
    /// Every supported filter type
    pub const ALL: [FilterType; 4] = [
        FilterType::Address,
        FilterType::Region,
        FilterType::NetworkBorderGroup,
        FilterType::Service,
    ];

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Address => "ip",
            FilterType::Region => "region",
            FilterType::NetworkBorderGroup => "network-border-group",
            FilterType::Service => "service",
        }
    }
}

impl FromStr for FilterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ip" | "address" => Ok(FilterType::Address),
            "region" => Ok(FilterType::Region),
            "network-border-group" | "network_border_group" => Ok(FilterType::NetworkBorderGroup),
            "service" => Ok(FilterType::Service),
            other => Err(Error::unknown_filter_type(other)),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filter criterion: a type and the values it accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    filter_type: FilterType,
    values: Vec<String>,
}

impl Filter {
    /// Create a filter accepting any of `values`
    pub fn new(filter_type: FilterType, values: Vec<String>) -> Self {
        Self {
            filter_type,
            values,
        }
    }

    /// Create a filter with a single value
    pub fn single(filter_type: FilterType, value: impl Into<String>) -> Self {
        Self::new(filter_type, vec![value.into()])
    }

    /// Create a filter from a type name as supplied by a caller
    pub fn parse(type_name: &str, values: Vec<String>) -> Result<Self> {
        Ok(Self::new(type_name.parse()?, values))
    }

    /// Filter type
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Accepted values
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=[{}]", self.filter_type, self.values.join(","))
    }
}

/// Caller-facing filter shape: `{"type": "region", "values": ["us-east-1"]}`
///
/// The type stays a plain string until [`FilterSpec::into_filter`] so that
/// an unsupported type is reported as a filter error rather than a
/// deserialization error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Filter type name
    #[serde(rename = "type")]
    pub filter_type: String,
    /// Accepted values
    pub values: Vec<String>,
}

impl FilterSpec {
    /// Convert into a typed filter
    pub fn into_filter(self) -> Result<Filter> {
        Filter::parse(&self.filter_type, self.values)
    }
}

/// Parse a JSON array of filter specs into typed filters
pub fn parse_filters(json: &str) -> Result<Vec<Filter>> {
    let specs: Vec<FilterSpec> = serde_json::from_str(json)?;
    specs.into_iter().map(FilterSpec::into_filter).collect()
}

/// Return the entries matching every filter, in dataset order
///
/// # Errors
///
/// - [`Error::MalformedFilterValue`]: a filter has no values, or an address
///   value is neither an IP address nor a CIDR
///
/// No matches is `Ok` with an empty vector.
pub fn evaluate<'a>(dataset: &'a Dataset, filters: &[Filter]) -> Result<Vec<&'a Entry>> {
    let matchers = filters
        .iter()
        .map(Matcher::compile)
        .collect::<Result<Vec<_>>>()?;

    let matches: Vec<&Entry> = dataset
        .entries()
        .iter()
        .filter(|entry| matchers.iter().all(|m| m.matches(entry)))
        .collect();

    tracing::debug!(
        "{} filter(s) matched {} of {} entries",
        filters.len(),
        matches.len(),
        dataset.len()
    );

    Ok(matches)
}

/// A filter with its values validated and parsed
enum Matcher<'f> {
    Address(Vec<AddressValue>),
    Attribute {
        field: fn(&Entry) -> &str,
        values: &'f [String],
    },
}

enum AddressValue {
    Ip(IpAddr),
    Network(IpNet),
}

impl<'f> Matcher<'f> {
    fn compile(filter: &'f Filter) -> Result<Self> {
        if filter.values.is_empty() {
            return Err(Error::malformed_filter_value(
                filter.filter_type.as_str(),
                "at least one value is required",
            ));
        }

        let field: fn(&Entry) -> &str = match filter.filter_type {
            FilterType::Address => {
                let values = filter
                    .values
                    .iter()
                    .map(String::as_str)
                    .map(parse_address_value)
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Matcher::Address(values));
            }
            FilterType::Region => region,
            FilterType::NetworkBorderGroup => network_border_group,
            FilterType::Service => service,
        };

        Ok(Matcher::Attribute {
            field,
            values: &filter.values,
        })
    }

    fn matches(&self, entry: &Entry) -> bool {
        match self {
            Matcher::Address(values) => {
                let Ok(network) = entry.ip_prefix.parse::<IpNet>() else {
                    tracing::trace!("Skipping entry with unparseable prefix {}", entry.ip_prefix);
                    return false;
                };
                values.iter().any(|value| match value {
                    AddressValue::Ip(ip) => network.contains(ip),
                    AddressValue::Network(net) => network.trunc() == net.trunc(),
                })
            }
            Matcher::Attribute { field, values } => {
                let actual = field(entry);
                values.iter().any(|v| v.eq_ignore_ascii_case(actual))
            }
        }
    }
}

fn region(entry: &Entry) -> &str {
    &entry.region
}

fn network_border_group(entry: &Entry) -> &str {
    &entry.network_border_group
}

fn service(entry: &Entry) -> &str {
    &entry.service
}

fn parse_address_value(value: &str) -> Result<AddressValue> {
    if let Ok(ip) = value.parse::<IpAddr>() {
        return Ok(AddressValue::Ip(ip));
    }
    if let Ok(net) = value.parse::<IpNet>() {
        return Ok(AddressValue::Network(net));
    }
    Err(Error::malformed_filter_value(
        FilterType::Address.as_str(),
        format!("'{}' is not an IP address or CIDR", value),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::new(
            "1",
            "2024-01-15-20-13-07",
            vec![
                Entry::new("3.5.0.0/19", "us-east-1", "us-east-1", "S3"),
                Entry::new("52.94.0.0/22", "us-east-1", "us-east-1", "DYNAMODB"),
                Entry::new("52.94.24.0/23", "us-west-2", "us-west-2", "DYNAMODB"),
                Entry::new("2600:1f18::/33", "us-east-1", "us-east-1", "EC2"),
                Entry::new("not-a-prefix", "us-east-1", "us-east-1", "EC2"),
            ],
        )
    }

    fn prefixes(entries: &[&Entry]) -> Vec<String> {
        entries.iter().map(|e| e.ip_prefix.clone()).collect()
    }

    #[test]
    fn test_filter_type_names() {
        assert_eq!("ip".parse::<FilterType>().unwrap(), FilterType::Address);
        assert_eq!("address".parse::<FilterType>().unwrap(), FilterType::Address);
        assert_eq!(
            "network_border_group".parse::<FilterType>().unwrap(),
            FilterType::NetworkBorderGroup
        );
        for t in FilterType::ALL {
            assert_eq!(t.as_str().parse::<FilterType>().unwrap(), t);
        }

        let err = "colour".parse::<FilterType>().unwrap_err();
        assert!(matches!(err, Error::UnknownFilterType(ref t) if t == "colour"));
    }

    #[test]
    fn test_values_within_filter_are_ored() {
        let data = dataset();
        let filters = vec![Filter::new(
            FilterType::Region,
            vec!["us-west-2".into(), "eu-west-1".into()],
        )];

        let matches = evaluate(&data, &filters).unwrap();
        assert_eq!(prefixes(&matches), vec!["52.94.24.0/23"]);
    }

    #[test]
    fn test_ipv6_containment() {
        let data = dataset();
        let filters = vec![Filter::single(FilterType::Address, "2600:1f18:1234::1")];

        let matches = evaluate(&data, &filters).unwrap();
        assert_eq!(prefixes(&matches), vec!["2600:1f18::/33"]);
    }

    #[test]
    fn test_cidr_value_matches_exact_network() {
        let data = dataset();

        let matches = evaluate(&data, &[Filter::single(FilterType::Address, "52.94.0.0/22")])
            .unwrap();
        assert_eq!(prefixes(&matches), vec!["52.94.0.0/22"]);

        let matches = evaluate(&data, &[Filter::single(FilterType::Address, "52.94.0.0/16")])
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_malformed_address_value() {
        let data = dataset();
        let err = evaluate(&data, &[Filter::single(FilterType::Address, "3.5.12")]).unwrap_err();
        assert!(matches!(err, Error::MalformedFilterValue { .. }));
    }

    #[test]
    fn test_empty_values_rejected() {
        let data = dataset();
        let err = evaluate(&data, &[Filter::new(FilterType::Service, vec![])]).unwrap_err();
        assert!(matches!(err, Error::MalformedFilterValue { .. }));
    }

    #[test]
    fn test_parse_filters_json() {
        let filters = parse_filters(
            r#"[{"type": "region", "values": ["us-east-1"]},
                {"type": "network-border-group", "values": ["us-east-1", "us-west-2"]}]"#,
        )
        .unwrap();

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].filter_type(), FilterType::Region);
        assert_eq!(filters[1].values().len(), 2);
        assert_eq!(
            filters[1].to_string(),
            "network-border-group=[us-east-1,us-west-2]"
        );

        let err = parse_filters(r#"[{"type": "zone", "values": ["a"]}]"#).unwrap_err();
        assert!(matches!(err, Error::UnknownFilterType(_)));

        let err = parse_filters("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
