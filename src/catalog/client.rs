//! Catalog client

use super::types::{CatalogIndex, Offer};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::source::scan_version;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Client for the master index and offer exports
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: HttpClient,
    /// Host prefix for offer version paths
    prefix: String,
    /// URL of the master index
    index_url: String,
}

impl CatalogClient {
    /// Create a client
    pub fn new(http: HttpClient, prefix: impl Into<String>, index_url: impl Into<String>) -> Self {
        Self {
            http,
            prefix: prefix.into(),
            index_url: index_url.into(),
        }
    }

    /// Host prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Download and parse the master index
    pub async fn fetch_index(&self) -> Result<CatalogIndex> {
        info!("Downloading master price list from {}", self.index_url);
        let index: CatalogIndex = self.http.get_json(&self.index_url).await?;
        if index.offers.is_empty() {
            return Err(Error::catalog(format!(
                "master index at {} lists no offers",
                self.index_url
            )));
        }
        Ok(index)
    }

    /// Stream an offer export to `<dir>/<offer>.csv` and read its version
    pub async fn download_offer(&self, offer: &str, url: &str, dir: &Path) -> Result<Offer> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            Error::output(format!("Failed to create directory {}: {e}", dir.display()))
        })?;
        let path = dir.join(format!("{offer}.csv"));

        info!("Downloading {url}");
        let mut response = self.http.get(url).await?;
        let mut file = tokio::fs::File::create(&path).await?;
        let mut bytes = 0usize;
        while let Some(chunk) = response.chunk().await? {
            bytes += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        let version = scan_version(BufReader::new(File::open(&path)?))?;
        info!(
            "Downloaded {offer} ({bytes} bytes, version {})",
            version.as_deref().unwrap_or("unknown")
        );

        Ok(Offer {
            id: offer.to_string(),
            source_path: path,
            version,
        })
    }
}
