//! Tests for engine module

use super::*;
use crate::config::{OfferFilter, PipelineConfig};
use crate::error::{Error, Result};
use crate::query::{
    JobId, JobStatusReport, NoWait, QueryBatchOrchestrator, QueryContext, QueryService,
    QueryStatus,
};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREAMBLE: &str = "\"FormatVersion\",\"v1.0\"\n\
\"Disclaimer\",\"For informational purposes only.\"\n\
\"Publication Date\",\"2024-05-01T00:00:00Z\"\n\
\"Version\",\"20240501000000\"\n\
\"OfferCode\",\"Offer\"\n";

fn s3_export() -> String {
    format!(
        "{PREAMBLE}\"SKU\",\"Location\",\"PricePerUnit\"\n\
\"A\",\"EU (Paris)\",\"0.023\"\n\
\"B\",\"US East (N. Virginia)\",\"0.021\"\n\
\"C\",\"EU (Paris)\",\"0.0125\"\n"
    )
}

fn support_export() -> String {
    format!("{PREAMBLE}\"SKU\",\"PricePerUnit\"\n\"X\",\"100\"\n")
}

fn empty_export() -> String {
    format!("{PREAMBLE}\"SKU\",\"PricePerUnit\"\n")
}

async fn catalog_server() -> MockServer {
    let server = MockServer::start().await;
    let offer = |code: &str| {
        json!({
            "offerCode": code,
            "currentVersionUrl": format!("/offers/v1.0/aws/{code}/current/index.json")
        })
    };
    Mock::given(method("GET"))
        .and(path("/offers/v1.0/aws/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "formatVersion": "v1.0",
            "offers": {
                "AmazonS3": offer("AmazonS3"),
                "AWSSupport": offer("AWSSupport"),
                "AmazonEmpty": offer("AmazonEmpty")
            }
        })))
        .mount(&server)
        .await;

    for (code, body) in [
        ("AmazonS3", s3_export()),
        ("AWSSupport", support_export()),
        ("AmazonEmpty", empty_export()),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/offers/v1.0/aws/{code}/current/index.csv")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }
    server
}

fn config(server: &MockServer, dir: &Path) -> PipelineConfig {
    PipelineConfig {
        prefix: server.uri(),
        price_url: format!("{}/offers/v1.0/aws/index.json", server.uri()),
        price_folder: dir.join("price_files"),
        ddl_folder: dir.join("ddl"),
        download_folder: dir.join("downloads"),
        bucket: "test-bucket".to_string(),
        destination: Some(dir.join("uploaded").display().to_string()),
        location_index: Some(dir.join("locations.json")),
        ..PipelineConfig::default()
    }
}

async fn ingested(filter: OfferFilter) -> (MockServer, TempDir, Pipeline, IngestSummary) {
    let server = catalog_server().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config(&server, dir.path()), filter).unwrap();
    let summary = pipeline.download_prices().await.unwrap();
    (server, dir, pipeline, summary)
}

/// Records submissions; every job succeeds unless its text starts with `fail_prefix`
#[derive(Default)]
struct RecordingService {
    submitted: Mutex<Vec<(String, Option<String>)>>,
    fail_prefix: Option<&'static str>,
}

impl RecordingService {
    fn queries(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|(q, _)| q.clone())
            .collect()
    }
}

#[async_trait]
impl QueryService for RecordingService {
    async fn submit(&self, query: &str, context: &QueryContext) -> Result<JobId> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((query.to_string(), context.database.clone()));
        Ok(JobId::new(format!("job-{}", submitted.len() - 1)))
    }

    async fn poll_batch(&self, ids: &[JobId]) -> Result<Vec<JobStatusReport>> {
        let submitted = self.submitted.lock().unwrap();
        Ok(ids
            .iter()
            .map(|id| {
                let index: usize = id.as_str()["job-".len()..].parse().unwrap();
                let failing = self
                    .fail_prefix
                    .is_some_and(|prefix| submitted[index].0.starts_with(prefix));
                let status = if failing {
                    QueryStatus::Failed
                } else {
                    QueryStatus::Succeeded
                };
                JobStatusReport::new(id.clone(), status)
            })
            .collect())
    }
}

fn orchestrator(
    service: Arc<RecordingService>,
) -> QueryBatchOrchestrator<Arc<RecordingService>, NoWait> {
    QueryBatchOrchestrator::new(
        service,
        NoWait,
        QueryContext::new("awspricedatabase", "s3://test-bucket/query_results"),
    )
}

// ============================================================================
// Ingest Tests
// ============================================================================

#[tokio::test]
async fn test_download_prices() {
    let (_server, dir, _pipeline, summary) = ingested(OfferFilter::default()).await;
    let root = dir.path();

    let offers: Vec<&str> = summary.offers.iter().map(|o| o.offer.as_str()).collect();
    assert_eq!(offers, vec!["AWSSupport", "AmazonS3"]);
    assert_eq!(summary.empty, vec!["AmazonEmpty"]);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.rows(), 4);
    assert_eq!(summary.partitions(), 3);

    let s3 = &summary.offers[1];
    assert_eq!(s3.version.as_deref(), Some("20240501000000"));
    assert_eq!(s3.partitions, vec!["EU (Paris)", "US East (N. Virginia)"]);
    assert_eq!(s3.definition, root.join("ddl/create_table_ddl_AmazonS3.sql"));

    assert!(root
        .join("price_files/AmazonS3/location=EU (Paris)/AmazonS3.csv")
        .is_file());
    assert!(root
        .join("price_files/AWSSupport/location=location-agnostic/AWSSupport.csv")
        .is_file());
    assert!(!root.join("ddl/create_table_ddl_AmazonEmpty.sql").exists());

    // raw exports are gone once ingested
    assert!(!root.join("downloads/AmazonS3.csv").exists());
    assert!(!root.join("downloads/AmazonEmpty.csv").exists());
}

#[tokio::test]
async fn test_table_definitions_follow_written_schema() {
    let (_server, dir, _pipeline, _summary) = ingested(OfferFilter::default()).await;

    let s3 =
        std::fs::read_to_string(dir.path().join("ddl/create_table_ddl_AmazonS3.sql")).unwrap();
    assert!(s3.starts_with(
        "CREATE EXTERNAL TABLE `AmazonS3`(\n  `SKU` string,\n  `PricePerUnit` string)\n"
    ));
    assert!(s3.contains("PARTITIONED BY (\n  `location` string)\n"));
    assert!(s3.contains("  's3://test-bucket/AmazonS3/'\n"));

    let support =
        std::fs::read_to_string(dir.path().join("ddl/create_table_ddl_AWSSupport.sql")).unwrap();
    assert!(!support.contains("PARTITIONED BY"));
}

#[tokio::test]
async fn test_location_index_written() {
    let (_server, dir, _pipeline, summary) = ingested(OfferFilter::default()).await;

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("locations.json")).unwrap()).unwrap();
    assert_eq!(
        written,
        json!({
            "EU (Paris)": ["AmazonS3"],
            "US East (N. Virginia)": ["AmazonS3"],
            "location-agnostic": ["AWSSupport"]
        })
    );
    assert_eq!(summary.location_index.len(), 3);
}

#[tokio::test]
async fn test_filter_skips_offers() {
    let filter = OfferFilter {
        include: vec!["AmazonS3".to_string(), "AWSSupport".to_string()],
        exclude: vec!["AWSSupport".to_string()],
    };
    let (server, dir, _pipeline, summary) = ingested(filter).await;

    assert_eq!(summary.offers.len(), 1);
    assert_eq!(summary.skipped, vec!["AWSSupport", "AmazonEmpty"]);
    assert!(!dir.path().join("price_files/AWSSupport").exists());

    let requested: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        requested,
        vec![
            "/offers/v1.0/aws/index.json",
            "/offers/v1.0/aws/AmazonS3/current/index.csv"
        ]
    );
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_files() {
    let (_server, dir, pipeline, _summary) = ingested(OfferFilter::default()).await;

    let uploaded = pipeline.upload_files().await.unwrap();
    assert_eq!(uploaded, 3);

    let dest = dir.path().join("uploaded");
    let copied =
        std::fs::read_to_string(dest.join("AmazonS3/location=US East (N. Virginia)/AmazonS3.csv"))
            .unwrap();
    assert_eq!(copied, "\"SKU\",\"PricePerUnit\"\n\"B\",\"0.021\"\n");
}

// ============================================================================
// Query Stage Tests
// ============================================================================

#[tokio::test]
async fn test_create_tables() {
    let (_server, _dir, pipeline, _summary) = ingested(OfferFilter::default()).await;
    let service = Arc::new(RecordingService::default());

    let report = pipeline
        .create_tables(&orchestrator(service.clone()))
        .await
        .unwrap();
    assert!(report.all_succeeded());
    assert_eq!(report.jobs.len(), 3);
    assert_eq!(report.submission_batches, 2);

    let submitted = service.submitted.lock().unwrap().clone();
    assert_eq!(
        submitted[0],
        ("CREATE DATABASE IF NOT EXISTS awspricedatabase".to_string(), None)
    );
    assert!(submitted[1].0.starts_with("CREATE EXTERNAL TABLE `AWSSupport`("));
    assert!(submitted[2].0.starts_with("CREATE EXTERNAL TABLE `AmazonS3`("));
    assert_eq!(submitted[1].1.as_deref(), Some("awspricedatabase"));
}

#[tokio::test]
async fn test_create_tables_stops_when_database_fails() {
    let (_server, _dir, pipeline, _summary) = ingested(OfferFilter::default()).await;
    let service = Arc::new(RecordingService {
        fail_prefix: Some("CREATE DATABASE"),
        ..RecordingService::default()
    });

    let result = pipeline.create_tables(&orchestrator(service.clone())).await;
    assert!(matches!(result, Err(Error::Query { .. })));
    assert_eq!(service.queries().len(), 1);
}

#[tokio::test]
async fn test_failed_table_is_reported() {
    let (_server, _dir, pipeline, _summary) = ingested(OfferFilter::default()).await;
    let service = Arc::new(RecordingService {
        fail_prefix: Some("CREATE EXTERNAL TABLE `AmazonS3`"),
        ..RecordingService::default()
    });

    let report = pipeline
        .create_tables(&orchestrator(service))
        .await
        .unwrap();
    assert_eq!(report.failed().count(), 1);
    assert_eq!(report.succeeded().count(), 2);
}

#[tokio::test]
async fn test_load_partitions() {
    let (_server, dir, pipeline, _summary) = ingested(OfferFilter::default()).await;
    std::fs::write(dir.path().join("ddl/README.txt"), "not a table").unwrap();
    let service = Arc::new(RecordingService::default());

    let report = pipeline
        .load_partitions(&orchestrator(service.clone()))
        .await
        .unwrap();
    assert_eq!(report.submission_batches, 1);
    assert_eq!(
        service.queries(),
        vec![
            "MSCK REPAIR TABLE awssupport;",
            "MSCK REPAIR TABLE amazons3;"
        ]
    );
}

#[tokio::test]
async fn test_missing_ddl_folder() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        ddl_folder: dir.path().join("nowhere"),
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config, OfferFilter::default()).unwrap();
    let service = Arc::new(RecordingService::default());

    let result = pipeline.load_partitions(&orchestrator(service)).await;
    assert!(matches!(result, Err(Error::FileNotFound { .. })));
}

#[test]
fn test_query_orchestrator_requires_endpoint() {
    let pipeline = Pipeline::new(PipelineConfig::default(), OfferFilter::default()).unwrap();
    assert!(matches!(
        pipeline.query_orchestrator(),
        Err(Error::MissingConfigField { .. })
    ));

    let config = PipelineConfig {
        query_endpoint: Some("http://localhost:9000".to_string()),
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config, OfferFilter::default()).unwrap();
    let orchestrator = pipeline.query_orchestrator().unwrap();
    assert_eq!(
        orchestrator.context().database.as_deref(),
        Some("awspricedatabase")
    );
}

#[tokio::test]
async fn test_run_with() {
    let server = catalog_server().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config(&server, dir.path()), OfferFilter::default()).unwrap();
    let service = Arc::new(RecordingService::default());

    let report = pipeline
        .run_with(&orchestrator(service.clone()))
        .await
        .unwrap();

    assert_eq!(report.ingest.offers.len(), 2);
    assert_eq!(report.uploaded, 3);
    assert_eq!(report.tables.jobs.len(), 3);
    assert_eq!(report.partitions.jobs.len(), 2);
    assert_eq!(service.queries().len(), 5);
}
