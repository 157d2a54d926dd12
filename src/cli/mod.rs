//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `run` - every stage, in order (default)
//! - `ingest` - download offers, write partitions and table definitions
//! - `upload` - ship the partition tree to the destination
//! - `create-tables` - create the database and every defined table
//! - `repair-partitions` - discover partitions, three tables at a time

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
