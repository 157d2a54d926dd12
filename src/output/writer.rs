//! Partitioned CSV writer
//!
//! Consumes one offer's rows in a single pass. Each distinct partition value
//! gets its own output stream, opened on the first row that needs it. The
//! first stream opened for an offer also fixes the offer's schema: every
//! partition of the offer is written with that column list.
//!
//! Streams are owned by the `write_offer` call and dropped (closed) on every
//! exit path, so an offer never leaks handles into the next one.

use crate::ddl::TableDefinition;
use crate::error::{Error, Result};
use crate::partition::{Partition, PartitionExtractor, PartitionKey};
use crate::source::Row;
use csv::{QuoteStyle, WriterBuilder};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Partition value → offers seen at that value, in first-seen order
pub type LocationIndex = BTreeMap<String, Vec<String>>;

/// One partition file written for an offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOutput {
    /// Partition value
    pub value: String,
    /// File path
    pub path: PathBuf,
    /// Data rows written (header excluded)
    pub rows: usize,
}

/// Everything written for one offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferLayout {
    /// Offer identifier
    pub offer: String,
    /// Column names, in file order
    pub schema: Vec<String>,
    /// Whether the schema-capturing row had a partition value
    pub has_partition_column: bool,
    /// Files written, ordered by partition value
    pub partitions: Vec<PartitionOutput>,
}

impl OfferLayout {
    /// Total data rows across all partitions
    pub fn rows(&self) -> usize {
        self.partitions.iter().map(|p| p.rows).sum()
    }

    /// Table definition matching what was written
    pub fn table_definition(&self, bucket: &str) -> TableDefinition {
        TableDefinition::new(
            &self.offer,
            self.schema.clone(),
            self.has_partition_column,
            bucket,
        )
    }
}

/// Column list captured from the first row of the first stream
#[derive(Debug)]
struct OfferSchema {
    columns: Vec<String>,
    has_partition_column: bool,
    /// Header the projection below was computed for
    source_columns: Vec<String>,
    /// Index into the source row for each schema column
    projection: Vec<usize>,
}

impl OfferSchema {
    fn capture(row: &Row, key: &PartitionKey, partition_column: &str) -> Self {
        let (projection, columns) = row
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| !(key.has_partition_column && c.as_str() == partition_column))
            .map(|(i, c)| (i, c.clone()))
            .unzip();
        Self {
            columns,
            has_partition_column: key.has_partition_column,
            source_columns: row.columns().to_vec(),
            projection,
        }
    }

    /// Values of `row` in schema order
    fn project<'r>(&mut self, offer: &str, row: &'r Row) -> Result<Vec<&'r str>> {
        if row.columns() != self.source_columns.as_slice() {
            self.projection = self
                .columns
                .iter()
                .enumerate()
                .map(|(n, c)| {
                    // the k-th schema copy of a name maps to the k-th copy in the row
                    let nth = self.columns[..n].iter().filter(|s| *s == c).count();
                    row.columns()
                        .iter()
                        .enumerate()
                        .filter(|(_, s)| *s == c)
                        .nth(nth)
                        .map(|(i, _)| i)
                        .ok_or_else(|| {
                            Error::schema(offer, format!("row is missing column '{c}'"))
                        })
                })
                .collect::<Result<_>>()?;
            self.source_columns = row.columns().to_vec();
        }
        Ok(self
            .projection
            .iter()
            .map(|&i| row.values()[i].as_str())
            .collect())
    }
}

/// An open partition file
struct PartitionStream {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl PartitionStream {
    /// Create the partition directory and file, and write the header
    fn create(root: &Path, partition: &Partition, columns: &[String]) -> Result<Self> {
        let dir = partition.dir(root);
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::output(format!("Failed to create directory {}: {e}", dir.display()))
        })?;

        let path = partition.file(root);
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_path(&path)
            .map_err(|e| Error::output(format!("Failed to create {}: {e}", path.display())))?;
        writer.write_record(columns)?;

        debug!("Opened partition {partition} at {}", path.display());
        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    fn write(&mut self, values: &[&str]) -> Result<()> {
        self.writer.write_record(values)?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self, value: String) -> Result<PartitionOutput> {
        self.writer
            .flush()
            .map_err(|e| Error::output(format!("Failed to flush {}: {e}", self.path.display())))?;
        Ok(PartitionOutput {
            value,
            path: self.path,
            rows: self.rows,
        })
    }
}

/// Streaming writer of location-partitioned offer files
#[derive(Debug)]
pub struct PartitionedWriter {
    /// Output root directory
    root: PathBuf,
    /// Partition key extraction
    extractor: PartitionExtractor,
    /// Offers observed per partition value, across the whole run
    location_index: LocationIndex,
}

impl PartitionedWriter {
    /// Create a writer rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extractor: PartitionExtractor::default(),
            location_index: LocationIndex::new(),
        }
    }

    /// Use a different partition extractor
    #[must_use]
    pub fn with_extractor(mut self, extractor: PartitionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Partition value → offers index accumulated so far
    pub fn location_index(&self) -> &LocationIndex {
        &self.location_index
    }

    /// Consume the writer, keeping the accumulated index
    pub fn into_location_index(self) -> LocationIndex {
        self.location_index
    }

    /// Write every row of one offer into its partition files
    ///
    /// Returns `None` when the offer has no rows: nothing is written and no
    /// table definition should be emitted. Any row error aborts the offer;
    /// files already written for it are left as they are and get overwritten
    /// by the next run.
    pub fn write_offer<I>(&mut self, offer: &str, rows: I) -> Result<Option<OfferLayout>>
    where
        I: IntoIterator<Item = Result<Row>>,
    {
        let mut streams: BTreeMap<Partition, PartitionStream> = BTreeMap::new();
        let mut schema: Option<OfferSchema> = None;

        for row in rows {
            let row = row?;
            let key = self.extractor.extract(&row);
            self.record_location(&key.value, offer);

            let stream = match streams.entry(Partition::new(offer, &key.value)) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let schema = schema.get_or_insert_with(|| {
                        OfferSchema::capture(&row, &key, self.extractor.column())
                    });
                    let stream = PartitionStream::create(&self.root, entry.key(), &schema.columns)?;
                    entry.insert(stream)
                }
            };

            // a stream only exists once the schema has been captured
            let Some(schema) = schema.as_mut() else {
                continue;
            };
            let values = schema.project(offer, &row)?;
            stream.write(&values)?;
        }

        let Some(schema) = schema else {
            debug!("Offer {offer} has no rows, nothing written");
            return Ok(None);
        };

        let partitions = streams
            .into_iter()
            .map(|(partition, stream)| stream.finish(partition.value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(OfferLayout {
            offer: offer.to_string(),
            schema: schema.columns,
            has_partition_column: schema.has_partition_column,
            partitions,
        }))
    }

    fn record_location(&mut self, value: &str, offer: &str) {
        let offers = self.location_index.entry(value.to_string()).or_default();
        if !offers.iter().any(|o| o == offer) {
            offers.push(offer.to_string());
        }
    }
}
