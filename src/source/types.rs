//! Row type
//!
//! A row is an ordered column → value mapping. The column names are shared
//! between all rows of one export.

use std::sync::Arc;

/// One data line of an offer export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Column names, in header order
    columns: Arc<[String]>,
    /// Values, aligned with `columns`
    values: Vec<String>,
}

impl Row {
    /// Create a row from a shared header and its values
    ///
    /// Callers guarantee `values.len() == columns.len()`.
    pub fn new(columns: Arc<[String]>, values: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self::new(columns.into(), values)
    }

    /// Column names in header order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in header order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value of a column, if the row has it
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].as_str())
    }

    /// Whether the row carries a column with this name
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(column, value)` pairs in header order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }
}
