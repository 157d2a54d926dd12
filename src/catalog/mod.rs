//! Catalog module
//!
//! Fetches the vendor's master price index and downloads per-offer exports.
//!
//! # Overview
//!
//! The master index maps offer codes to version URLs. Each offer's current
//! version is published as JSON and CSV side by side; the pipeline downloads
//! the CSV export to disk so it can be scanned twice (version, then rows).

mod client;
mod types;

pub use client::CatalogClient;
pub use types::{CatalogIndex, Offer, OfferEntry};
