//! Partition module
//!
//! Decides, row by row, which location partition a row belongs to.
//!
//! # Overview
//!
//! Rows carrying a non-empty `Location` value are partitioned by that value.
//! Every other row lands in the sentinel `location-agnostic` partition. The
//! decision is made per row: rows of the same export may or may not carry
//! a location.

mod extractor;
mod types;

pub use extractor::PartitionExtractor;
pub use types::{
    Partition, PartitionKey, DECLARED_PARTITION_COLUMN, LOCATION_AGNOSTIC, PARTITION_COLUMN,
};
