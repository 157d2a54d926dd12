//! Pipeline result types

use crate::catalog::Offer;
use crate::output::{LocationIndex, OfferLayout};
use crate::query::BatchReport;
use serde::Serialize;
use std::path::PathBuf;

/// What the ingest stage produced for one offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferSummary {
    /// Offer identifier
    pub offer: String,
    /// Export version from the metadata preamble
    pub version: Option<String>,
    /// Data rows written across all partitions
    pub rows: usize,
    /// Partition values written, in order
    pub partitions: Vec<String>,
    /// Table definition file
    pub definition: PathBuf,
}

impl OfferSummary {
    /// Summarize a written offer
    pub fn new(offer: &Offer, layout: &OfferLayout, definition: PathBuf) -> Self {
        Self {
            offer: offer.id.clone(),
            version: offer.version.clone(),
            rows: layout.rows(),
            partitions: layout.partitions.iter().map(|p| p.value.clone()).collect(),
            definition,
        }
    }
}

/// Outcome of the ingest stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    /// Offers written, in catalog order
    pub offers: Vec<OfferSummary>,
    /// Offers whose export had no data rows
    pub empty: Vec<String>,
    /// Offers left out by the filter
    pub skipped: Vec<String>,
    /// Partition value → offers seen at that value
    pub location_index: LocationIndex,
}

impl IngestSummary {
    /// Data rows written across all offers
    pub fn rows(&self) -> usize {
        self.offers.iter().map(|o| o.rows).sum()
    }

    /// Partition files written across all offers
    pub fn partitions(&self) -> usize {
        self.offers.iter().map(|o| o.partitions.len()).sum()
    }
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Ingest stage
    pub ingest: IngestSummary,
    /// Files uploaded
    pub uploaded: usize,
    /// Database and table creation queries
    pub tables: BatchReport,
    /// Partition discovery queries
    pub partitions: BatchReport,
}
