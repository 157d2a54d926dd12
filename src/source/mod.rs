//! Row source module
//!
//! Reads one offer's tabular export as a lazy sequence of rows.
//!
//! # Overview
//!
//! A vendor export starts with a fixed preamble of metadata lines
//! (publication date, version, disclaimer...), followed by a regular CSV
//! table. Two scans operate on it:
//! - [`RowSource`] skips the preamble and yields one [`Row`] per data line
//! - [`scan_version`] reads only the preamble and returns the `Version` value

mod reader;
mod types;

pub use reader::{scan_version, RowSource, PREAMBLE_LINES, VERSION_MARKER};
pub use types::Row;
