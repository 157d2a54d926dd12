//! Export reader
//!
//! Skips the metadata preamble and parses the remaining CSV table with the
//! `csv` crate. Rows with more or fewer fields than the header are a hard
//! error: ingestion of that offer must stop rather than drop rows. A header
//! naming the same column twice is rejected up front.

use super::types::Row;
use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// Number of metadata lines preceding the CSV header in a vendor export
pub const PREAMBLE_LINES: usize = 5;

/// First field of the preamble line carrying the export version
pub const VERSION_MARKER: &str = "Version";

/// Lazy row iterator over one offer export
pub struct RowSource<R: Read> {
    /// Label used in error messages (usually the offer code)
    label: String,
    reader: csv::Reader<BufReader<R>>,
    columns: Arc<[String]>,
    record: StringRecord,
    done: bool,
}

impl RowSource<File> {
    /// Open an export file on disk
    pub fn open(label: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_reader(label, file)
    }
}

impl<R: Read> RowSource<R> {
    /// Create a row source over any reader positioned at the start of an export
    pub fn from_reader(label: impl Into<String>, inner: R) -> Result<Self> {
        let label = label.into();
        let mut buffered = BufReader::new(inner);

        let skipped = skip_lines(&mut buffered, PREAMBLE_LINES)?;
        if skipped < PREAMBLE_LINES {
            return Err(Error::schema(
                &label,
                format!("export ends after {skipped} of {PREAMBLE_LINES} preamble lines"),
            ));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(buffered);

        let headers = reader.headers()?;
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(Error::schema(&label, "missing header line"));
        }
        let mut seen = HashSet::new();
        if let Some(name) = headers.iter().find(|name| !seen.insert(*name)) {
            return Err(Error::schema(
                &label,
                format!("duplicate column '{name}' in header"),
            ));
        }
        let columns: Arc<[String]> = headers.iter().map(String::from).collect();

        Ok(Self {
            label,
            reader,
            columns,
            record: StringRecord::new(),
            done: false,
        })
    }

    /// Column names from the header line
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Label given at construction
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<R: Read> Iterator for RowSource<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(Row::new(
                Arc::clone(&self.columns),
                self.record.iter().map(String::from).collect(),
            ))),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(Error::schema(&self.label, e.to_string())))
            }
        }
    }
}

/// Find the export version in the metadata preamble
///
/// Returns the second field of the first preamble line whose first field is
/// [`VERSION_MARKER`], or `None` when no such line exists. The window is the
/// first [`PREAMBLE_LINES`] raw lines, blank ones included, the same lines
/// [`RowSource`] skips.
pub fn scan_version<R: Read>(inner: R) -> Result<Option<String>> {
    let mut buffered = BufReader::new(inner);
    let mut line = Vec::new();
    for _ in 0..PREAMBLE_LINES {
        line.clear();
        if buffered.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_slice());
        if let Some(record) = reader.records().next() {
            let record = record?;
            if record.get(0) == Some(VERSION_MARKER) {
                return Ok(record.get(1).map(String::from));
            }
        }
    }
    Ok(None)
}

/// Consume up to `count` lines, returning how many were actually read
fn skip_lines<R: BufRead>(reader: &mut R, count: usize) -> Result<usize> {
    let mut buf = Vec::new();
    for skipped in 0..count {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(skipped);
        }
    }
    Ok(count)
}
