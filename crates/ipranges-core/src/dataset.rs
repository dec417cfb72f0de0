// # Dataset
//
// In-memory form of the published `ip-ranges.json` document.
//
// ## Document Format
//
// ```json
// {
//   "syncToken": "1705349587",
//   "createDate": "2024-01-15-20-13-07",
//   "prefixes": [
//     {
//       "ip_prefix": "3.5.140.0/22",
//       "region": "ap-northeast-2",
//       "service": "AMAZON",
//       "network_border_group": "ap-northeast-2"
//     }
//   ],
//   "ipv6_prefixes": [
//     {
//       "ipv6_prefix": "2600:1f18::/33",
//       "region": "us-east-1",
//       "service": "EC2",
//       "network_border_group": "us-east-1"
//     }
//   ]
// }
// ```
//
// IPv4 and IPv6 records are folded into a single ordered list of entries:
// IPv4 first, then IPv6, each in document order.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Format of the `createDate` field (`YYYY-MM-DD-HH-MM-SS`, UTC)
pub const CREATE_DATE_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Exact width of a well-formed `createDate` value
const CREATE_DATE_LEN: usize = 19;

/// Positions of the `-` separators inside `createDate`
const CREATE_DATE_SEPARATORS: [usize; 5] = [4, 7, 10, 13, 16];

/// One address range record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Address range in CIDR notation
    pub ip_prefix: String,
    /// AWS region or `GLOBAL`
    pub region: String,
    /// Network border group or `GLOBAL`
    pub network_border_group: String,
    /// Service identifier (e.g. `AMAZON`, `EC2`, `S3`)
    pub service: String,
}

impl Entry {
    /// Create a new entry
    pub fn new(
        ip_prefix: impl Into<String>,
        region: impl Into<String>,
        network_border_group: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            ip_prefix: ip_prefix.into(),
            region: region.into(),
            network_border_group: network_border_group.into(),
            service: service.into(),
        }
    }
}

/// A loaded, immutable snapshot of the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    sync_token: String,
    create_date: String,
    entries: Vec<Entry>,
}

#[derive(Deserialize)]
struct Document {
    #[serde(rename = "syncToken", default)]
    sync_token: String,
    #[serde(rename = "createDate")]
    create_date: String,
    prefixes: Vec<Entry>,
    #[serde(default)]
    ipv6_prefixes: Vec<Ipv6Record>,
}

#[derive(Deserialize)]
struct Ipv6Record {
    ipv6_prefix: String,
    region: String,
    network_border_group: String,
    service: String,
}

impl From<Ipv6Record> for Entry {
    fn from(record: Ipv6Record) -> Self {
        Self {
            ip_prefix: record.ipv6_prefix,
            region: record.region,
            network_border_group: record.network_border_group,
            service: record.service,
        }
    }
}

impl Dataset {
    /// Build a dataset directly from its parts
    pub fn new(
        sync_token: impl Into<String>,
        create_date: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Self {
        Self {
            sync_token: sync_token.into(),
            create_date: create_date.into(),
            entries,
        }
    }

    /// Deserialize a dataset from the published JSON document
    ///
    /// Only the document structure is checked here; the timestamp is
    /// validated separately by [`Dataset::created_at`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: Document = serde_json::from_slice(bytes)?;

        let mut entries = document.prefixes;
        entries.extend(document.ipv6_prefixes.into_iter().map(Entry::from));

        Ok(Self {
            sync_token: document.sync_token,
            create_date: document.create_date,
            entries,
        })
    }

    /// Publication sync token (empty when the document carried none)
    pub fn sync_token(&self) -> &str {
        &self.sync_token
    }

    /// Raw `createDate` text
    pub fn create_date(&self) -> &str {
        &self.create_date
    }

    /// All entries in document order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dataset has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the creation timestamp
    ///
    /// # Returns
    ///
    /// - `Ok(DateTime<Utc>)`: The creation time
    /// - `Err(Error::CorruptTimestamp)`: The value is not in the fixed format
    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        parse_create_date(&self.create_date)
    }
}

/// Parse a `createDate` value in the fixed published format
///
/// The value must be exactly `YYYY-MM-DD-HH-MM-SS` with every field
/// zero-padded; shorter or otherwise shaped variants are rejected even when
/// a lenient parser would accept them.
pub fn parse_create_date(value: &str) -> Result<DateTime<Utc>> {
    if value.len() != CREATE_DATE_LEN {
        return Err(Error::corrupt_timestamp(
            value,
            format!("expected {} characters, got {}", CREATE_DATE_LEN, value.len()),
        ));
    }

    for (i, byte) in value.bytes().enumerate() {
        let ok = if CREATE_DATE_SEPARATORS.contains(&i) {
            byte == b'-'
        } else {
            byte.is_ascii_digit()
        };
        if !ok {
            return Err(Error::corrupt_timestamp(
                value,
                format!("unexpected character at position {}", i),
            ));
        }
    }

    NaiveDateTime::parse_from_str(value, CREATE_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::corrupt_timestamp(value, e.to_string()))
}

/// Format a timestamp in the published `createDate` format
pub fn format_create_date(at: DateTime<Utc>) -> String {
    at.format(CREATE_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const DOCUMENT: &str = r#"{
        "syncToken": "1705349587",
        "createDate": "2024-01-15-20-13-07",
        "prefixes": [
            {"ip_prefix": "3.5.140.0/22", "region": "ap-northeast-2", "service": "AMAZON", "network_border_group": "ap-northeast-2"},
            {"ip_prefix": "52.94.76.0/22", "region": "us-west-2", "service": "AMAZON", "network_border_group": "us-west-2"}
        ],
        "ipv6_prefixes": [
            {"ipv6_prefix": "2600:1f18::/33", "region": "us-east-1", "service": "EC2", "network_border_group": "us-east-1"}
        ]
    }"#;

    #[test]
    fn test_from_slice_folds_ipv6_after_ipv4() {
        let dataset = Dataset::from_slice(DOCUMENT.as_bytes()).unwrap();

        assert_eq!(dataset.sync_token(), "1705349587");
        assert_eq!(dataset.create_date(), "2024-01-15-20-13-07");
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.entries()[0].ip_prefix, "3.5.140.0/22");
        assert_eq!(dataset.entries()[1].ip_prefix, "52.94.76.0/22");
        assert_eq!(dataset.entries()[2].ip_prefix, "2600:1f18::/33");
        assert_eq!(dataset.entries()[2].service, "EC2");
    }

    #[test]
    fn test_from_slice_without_ipv6_section() {
        let json = r#"{"createDate": "2024-01-15-20-13-07", "prefixes": []}"#;
        let dataset = Dataset::from_slice(json.as_bytes()).unwrap();

        assert!(dataset.is_empty());
        assert_eq!(dataset.sync_token(), "");
    }

    #[test]
    fn test_from_slice_rejects_garbage() {
        assert!(Dataset::from_slice(b"not json").is_err());
        assert!(Dataset::from_slice(br#"{"prefixes": []}"#).is_err());
    }

    #[test]
    fn test_created_at_parses_fixed_format() {
        let dataset = Dataset::from_slice(DOCUMENT.as_bytes()).unwrap();
        let created = dataset.created_at().unwrap();

        assert_eq!(created.year(), 2024);
        assert_eq!(created.month(), 1);
        assert_eq!(created.day(), 15);
        assert_eq!(created.hour(), 20);
        assert_eq!(created.minute(), 13);
        assert_eq!(created.second(), 7);
    }

    #[test]
    fn test_parse_create_date_is_strict() {
        for bad in [
            "",
            "2024-1-15-20-13-07",
            "2024-01-15T20:13:07",
            "2024-01-15 20-13-07",
            "2024-13-15-20-13-07",
            "2024-01-15-25-13-07",
            "24-01-15-20-13-07",
            "2024-01-15-20-13-07Z",
        ] {
            let err = parse_create_date(bad).unwrap_err();
            assert!(
                matches!(err, Error::CorruptTimestamp { .. }),
                "expected corrupt timestamp for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_format_create_date_round_trips() {
        let at = parse_create_date("2023-12-31-23-59-59").unwrap();
        assert_eq!(format_create_date(at), "2023-12-31-23-59-59");
    }
}
