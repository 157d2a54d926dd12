//! Pipeline configuration
//!
//! This module contains the configuration structures loaded from YAML:
//! the pipeline settings and the optional offer filter file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Pipeline Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Host prefix prepended to every offer's version URL
    pub prefix: String,

    /// URL of the master price index
    pub price_url: String,

    /// Root folder for partitioned output files
    pub price_folder: PathBuf,

    /// Folder receiving one table definition per offer
    pub ddl_folder: PathBuf,

    /// Scratch folder for raw offer exports
    pub download_folder: PathBuf,

    /// Database the tables are created in
    pub database: String,

    /// Bucket backing table locations and query results
    pub bucket: String,

    /// Upload destination URL (defaults to `s3://<bucket>`)
    pub destination: Option<String>,

    /// Base URL of the query service JSON API
    pub query_endpoint: Option<String>,

    /// Extra headers sent with every query service call
    pub query_headers: HashMap<String, String>,

    /// Delay between two status polls, in milliseconds
    pub poll_interval_ms: u64,

    /// Where to write the location → offers index (JSON)
    pub location_index: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prefix: "https://pricing.us-east-1.amazonaws.com".to_string(),
            price_url: "https://pricing.us-east-1.amazonaws.com/offers/v1.0/aws/index.json"
                .to_string(),
            price_folder: PathBuf::from("./price_files"),
            ddl_folder: PathBuf::from("./ddl"),
            download_folder: PathBuf::from("./downloads"),
            database: "awspricedatabase".to_string(),
            bucket: "aws-price-magician-data".to_string(),
            destination: None,
            query_endpoint: None,
            query_headers: HashMap::new(),
            poll_interval_ms: 2000,
            location_index: None,
        }
    }
}

impl PipelineConfig {
    /// Load config from a YAML file, missing fields fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would only fail much later in the run
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::invalid_value("bucket", "must not be empty"));
        }
        if self.database.is_empty() {
            return Err(Error::invalid_value("database", "must not be empty"));
        }
        url::Url::parse(&self.price_url)?;
        Ok(())
    }

    /// Upload destination, `s3://<bucket>` unless overridden
    pub fn destination_url(&self) -> String {
        self.destination
            .clone()
            .unwrap_or_else(|| format!("s3://{}", self.bucket))
    }

    /// Where the query service writes result sets
    pub fn output_location(&self) -> String {
        format!("s3://{}/query_results", self.bucket)
    }

    /// Fixed delay between status polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Query endpoint, required by the table stages
    pub fn require_query_endpoint(&self) -> Result<&str> {
        self.query_endpoint
            .as_deref()
            .ok_or_else(|| Error::missing_field("query_endpoint"))
    }
}

// ============================================================================
// Offer Filter
// ============================================================================

/// Offer selection loaded from a filter file
///
/// An empty `include` list selects every offer; `exclude` always wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferFilter {
    /// Offer codes to process
    pub include: Vec<String>,
    /// Offer codes to skip
    pub exclude: Vec<String>,
}

impl OfferFilter {
    /// Load a filter from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Whether an offer passes the filter
    pub fn allows(&self, offer_code: &str) -> bool {
        if self.exclude.iter().any(|o| o == offer_code) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|o| o == offer_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.price_folder, PathBuf::from("./price_files"));
        assert_eq!(config.ddl_folder, PathBuf::from("./ddl"));
        assert_eq!(config.database, "awspricedatabase");
        assert_eq!(config.destination_url(), "s3://aws-price-magician-data");
        assert_eq!(
            config.output_location(),
            "s3://aws-price-magician-data/query_results"
        );
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r"
bucket: my-prices
database: pricing
query_endpoint: http://localhost:9000
query_headers:
  X-Api-Key: secret
";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.bucket, "my-prices");
        assert_eq!(config.database, "pricing");
        assert_eq!(config.require_query_endpoint().unwrap(), "http://localhost:9000");
        assert_eq!(
            config.query_headers.get("X-Api-Key"),
            Some(&"secret".to_string())
        );
        // untouched fields keep their defaults
        assert_eq!(config.ddl_folder, PathBuf::from("./ddl"));
    }

    #[test]
    fn test_from_yaml_empty() {
        let config = PipelineConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.bucket, "aws-price-magician-data");
    }

    #[test]
    fn test_validate_rejects_empty_bucket() {
        let result = PipelineConfig::from_yaml("bucket: ''");
        assert!(matches!(result, Err(Error::InvalidConfigValue { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_price_url() {
        let result = PipelineConfig::from_yaml("price_url: not a url");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_missing_query_endpoint() {
        let config = PipelineConfig::default();
        assert!(matches!(
            config.require_query_endpoint(),
            Err(Error::MissingConfigField { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PipelineConfig::load("/definitely/not/here.yaml");
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_filter_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "include:\n  - AmazonEC2\n  - AmazonS3\nexclude:\n  - AmazonS3").unwrap();

        let filter = OfferFilter::load(file.path()).unwrap();
        assert_eq!(filter.include, vec!["AmazonEC2", "AmazonS3"]);
        assert!(filter.allows("AmazonEC2"));
        assert!(!filter.allows("AmazonS3"));
        assert!(!filter.allows("AWSLambda"));
    }

    #[test_case("AmazonEC2", true ; "plain offer")]
    #[test_case("AWSLambda", true ; "another offer")]
    #[test_case("AmazonRDS", false ; "excluded offer")]
    fn test_filter_exclude_only(offer: &str, expected: bool) {
        let filter = OfferFilter {
            include: vec![],
            exclude: vec!["AmazonRDS".to_string()],
        };
        assert_eq!(filter.allows(offer), expected);
    }
}
