// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # price-lake
//!
//! Turns a vendor price catalog into a queryable data lake: location-partitioned
//! CSV files, one external table per offer, and partition discovery driven
//! through a remote query service.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use price_lake::config::{OfferFilter, PipelineConfig};
//! use price_lake::engine::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> price_lake::Result<()> {
//!     let config = PipelineConfig::load("pipeline.yaml")?;
//!     let pipeline = Pipeline::new(config, OfferFilter::default())?;
//!     let report = pipeline.run().await?;
//!     println!("{} rows ingested", report.ingest.rows());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────────────┐   ┌──────────────┐
//! │ Catalog  │ → │ Row Source │ → │ Partitioned     │ → │ Table        │
//! │ (HTTP)   │   │ (preamble) │   │ Writer (CSV)    │   │ Definitions  │
//! └──────────┘   └────────────┘   └────────┬────────┘   └──────┬───────┘
//!                                          │                   │
//!                                  ┌───────┴───────┐   ┌───────┴────────┐
//!                                  │ Object Store  │   │ Query Batch    │
//!                                  │ Upload        │   │ Orchestrator   │
//!                                  └───────────────┘   └────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Pipeline configuration and offer filter
pub mod config;

/// HTTP client
pub mod http;

/// Master index and offer downloads
pub mod catalog;

/// Offer export reader
pub mod source;

/// Partition keys
pub mod partition;

/// Table definitions and query statements
pub mod ddl;

/// Partitioned CSV output and upload
pub mod output;

/// Remote query batches
pub mod query;

/// Pipeline stages
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
