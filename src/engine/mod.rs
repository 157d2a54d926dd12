//! Execution engine module
//!
//! Wires the pipeline stages together.
//!
//! # Overview
//!
//! - `download_prices` - catalog → row source → partitioned writer → table
//!   definitions
//! - `upload_files` - ship the partition tree to the destination
//! - `create_tables` - bulk discipline over the table definitions
//! - `load_partitions` - chunked discipline of partition repairs
//! - `run` - all four, in order

mod pipeline;
mod types;

pub use pipeline::Pipeline;
pub use types::{IngestSummary, OfferSummary, RunReport};

#[cfg(test)]
mod tests;
