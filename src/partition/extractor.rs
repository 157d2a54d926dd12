//! Partition key extraction

use super::types::{PartitionKey, PARTITION_COLUMN};
use crate::source::Row;

/// Extracts the partition key of a row from a named column
#[derive(Debug, Clone)]
pub struct PartitionExtractor {
    column: String,
}

impl Default for PartitionExtractor {
    fn default() -> Self {
        Self::new(PARTITION_COLUMN)
    }
}

impl PartitionExtractor {
    /// Create an extractor keyed on `column`
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// Name of the partition column
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Partition key of one row
    ///
    /// A present but empty column counts as absent.
    pub fn extract(&self, row: &Row) -> PartitionKey {
        match row.get(&self.column) {
            Some(value) if !value.is_empty() => PartitionKey::located(value),
            _ => PartitionKey::agnostic(),
        }
    }
}
