//! Catalog types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Master price index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogIndex {
    /// Index format version
    #[serde(default)]
    pub format_version: Option<String>,
    /// Publication timestamp of the index
    #[serde(default)]
    pub publication_date: Option<String>,
    /// Offers keyed by offer code
    #[serde(default)]
    pub offers: BTreeMap<String, OfferEntry>,
}

/// One offer listed in the master index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferEntry {
    /// Offer code (e.g. `AmazonEC2`)
    #[serde(default)]
    pub offer_code: Option<String>,
    /// Path of the current JSON version, relative to the host prefix
    pub current_version_url: String,
    /// Path of the version index
    #[serde(default)]
    pub version_index_url: Option<String>,
    /// Path of the current region index
    #[serde(default)]
    pub current_region_index_url: Option<String>,
}

impl OfferEntry {
    /// URL of the CSV export of the current version
    pub fn csv_url(&self, prefix: &str) -> String {
        let path = match self.current_version_url.strip_suffix(".json") {
            Some(stem) => format!("{stem}.csv"),
            None => self.current_version_url.replace("json", "csv"),
        };
        format!("{}{path}", prefix.trim_end_matches('/'))
    }
}

/// An offer whose export has been downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Offer identifier
    pub id: String,
    /// Local path of the raw export
    pub source_path: PathBuf,
    /// Export version from the metadata preamble
    pub version: Option<String>,
}
