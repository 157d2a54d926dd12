//! Partition types
//!
//! Defines the partition key and the on-disk layout of a partition.

use std::fmt;
use std::path::{Path, PathBuf};

/// Column of the export that carries the partition value
pub const PARTITION_COLUMN: &str = "Location";

/// Partition column name declared in table definitions and directory names
pub const DECLARED_PARTITION_COLUMN: &str = "location";

/// Partition value for rows without a location
pub const LOCATION_AGNOSTIC: &str = "location-agnostic";

/// Result of partition key extraction for one row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    /// Whether the row had a non-empty partition column
    pub has_partition_column: bool,
    /// Partition value, or [`LOCATION_AGNOSTIC`]
    pub value: String,
}

impl PartitionKey {
    /// Key for a row with a location
    pub fn located(value: impl Into<String>) -> Self {
        Self {
            has_partition_column: true,
            value: value.into(),
        }
    }

    /// Key for a row without a location
    pub fn agnostic() -> Self {
        Self {
            has_partition_column: false,
            value: LOCATION_AGNOSTIC.to_string(),
        }
    }

    /// Whether this is the sentinel partition
    pub fn is_agnostic(&self) -> bool {
        !self.has_partition_column
    }
}

/// One (offer, partition value) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    /// Offer identifier
    pub offer: String,
    /// Partition value
    pub value: String,
}

impl Partition {
    /// Create a new partition
    pub fn new(offer: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            offer: offer.into(),
            value: value.into(),
        }
    }

    /// Hive-style partition directory: `{root}/{offer}/location={value}`
    ///
    /// Values are otherwise taken as they are, but `%`, `/` and `\` are
    /// percent-escaped so the value stays one path segment.
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(&self.offer).join(format!(
            "{DECLARED_PARTITION_COLUMN}={}",
            escape_path_value(&self.value)
        ))
    }

    /// Output file of the partition: `{root}/{offer}/location={value}/{offer}.csv`
    pub fn file(&self, root: &Path) -> PathBuf {
        self.dir(root).join(format!("{}.csv", self.offer))
    }
}

/// Percent-escape the characters that would split or alias a path segment
fn escape_path_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{DECLARED_PARTITION_COLUMN}={}", self.offer, self.value)
    }
}
