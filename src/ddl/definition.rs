//! Table definition model and renderer

use crate::error::{Error, Result};
use crate::partition::DECLARED_PARTITION_COLUMN;
use std::fmt;
use std::path::{Path, PathBuf};

/// File name prefix of rendered table definitions
pub const DDL_FILE_PREFIX: &str = "create_table_ddl_";

/// File extension of rendered table definitions
pub const DDL_FILE_EXTENSION: &str = "sql";

const SERDE: &str = "org.apache.hadoop.hive.serde2.OpenCSVSerde";
const INPUT_FORMAT: &str = "org.apache.hadoop.mapred.TextInputFormat";
const OUTPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.HiveIgnoreKeyTextOutputFormat";

const TABLE_PROPERTIES: &[(&str, &str)] = &[
    ("classification", "csv"),
    ("columnsOrdered", "true"),
    ("compressionType", "none"),
    ("delimiter", ","),
    ("skip.header.line.count", "1"),
    ("typeOfData", "file"),
];

/// External table definition for one offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    /// Offer identifier, used verbatim as the table name
    offer: String,
    /// Column names in file order
    columns: Vec<String>,
    /// Whether the table is partitioned by `location`
    partitioned: bool,
    /// Data location URI (`s3://bucket/offer/`)
    location: String,
}

impl TableDefinition {
    /// Create a definition whose data lives under `s3://{bucket}/{offer}/`
    pub fn new(
        offer: impl Into<String>,
        columns: Vec<String>,
        partitioned: bool,
        bucket: &str,
    ) -> Self {
        let offer = offer.into();
        let location = format!("s3://{bucket}/{offer}/");
        Self {
            offer,
            columns,
            partitioned,
            location,
        }
    }

    /// Offer identifier
    pub fn offer(&self) -> &str {
        &self.offer
    }

    /// Declared columns
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether a partition clause is rendered
    pub fn is_partitioned(&self) -> bool {
        self.partitioned
    }

    /// Data location URI
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Name the query service knows the table by
    pub fn table_name(&self) -> String {
        self.offer.to_lowercase()
    }

    /// File name of the rendered definition
    pub fn file_name(&self) -> String {
        format!("{DDL_FILE_PREFIX}{}.{DDL_FILE_EXTENSION}", self.offer)
    }

    /// Render the definition as query text
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the rendered definition into `dir`, overwriting any previous one
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::output(format!("Failed to create directory {}: {e}", dir.display()))
        })?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.render())
            .map_err(|e| Error::output(format!("Failed to write {}: {e}", path.display())))?;
        Ok(path)
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CREATE EXTERNAL TABLE `{}`(", self.offer)?;
        let last = self.columns.len().saturating_sub(1);
        for (i, column) in self.columns.iter().enumerate() {
            let sep = if i == last { ")" } else { "," };
            writeln!(f, "  `{column}` string{sep}")?;
        }
        if self.columns.is_empty() {
            writeln!(f, ")")?;
        }

        if self.partitioned {
            writeln!(f, "PARTITIONED BY (")?;
            writeln!(f, "  `{DECLARED_PARTITION_COLUMN}` string)")?;
        }

        writeln!(f, "ROW FORMAT SERDE")?;
        writeln!(f, "  '{SERDE}'")?;
        writeln!(f, "STORED AS INPUTFORMAT")?;
        writeln!(f, "  '{INPUT_FORMAT}'")?;
        writeln!(f, "OUTPUTFORMAT")?;
        writeln!(f, "  '{OUTPUT_FORMAT}'")?;
        writeln!(f, "LOCATION")?;
        writeln!(f, "  '{}'", self.location)?;

        writeln!(f, "TBLPROPERTIES (")?;
        let last = TABLE_PROPERTIES.len() - 1;
        for (i, (key, value)) in TABLE_PROPERTIES.iter().enumerate() {
            let sep = if i == last { ")" } else { "," };
            writeln!(f, "  '{key}'='{value}'{sep}")?;
        }
        Ok(())
    }
}

/// Table name for a definition file name (`create_table_ddl_AmazonS3.sql` → `amazons3`)
pub fn table_name_from_file(file_name: &str) -> Option<String> {
    let offer = file_name
        .strip_prefix(DDL_FILE_PREFIX)?
        .strip_suffix(DDL_FILE_EXTENSION)?
        .strip_suffix('.')?;
    if offer.is_empty() {
        return None;
    }
    Some(offer.to_lowercase())
}

/// Statement that discovers the partitions of a table
pub fn repair_statement(table: &str) -> String {
    format!("MSCK REPAIR TABLE {table};")
}

/// Statement that creates the target database
pub fn create_database_statement(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {database}")
}
