//! Output module
//!
//! Writes location-partitioned CSV files and ships them to object storage.
//!
//! # Overview
//!
//! This module provides:
//! - [`PartitionedWriter`] - single pass over an offer's rows, one lazily
//!   opened CSV stream per (offer, location) partition
//! - [`OfferLayout`] - what was written for an offer, including the schema
//!   the table definition must declare
//! - [`CloudDestination`] - object storage upload (S3 or local filesystem)

mod cloud;
mod writer;

pub use cloud::CloudDestination;
pub use writer::{LocationIndex, OfferLayout, PartitionOutput, PartitionedWriter};
