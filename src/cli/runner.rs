//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{OfferFilter, PipelineConfig};
use crate::engine::Pipeline;
use crate::error::Result;
use crate::query::BatchReport;
use serde_json::{json, Value};
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let pipeline = Pipeline::new(self.load_config()?, self.load_filter()?)?;

        match self.cli.command.unwrap_or(Commands::Run) {
            Commands::Run => {
                let report = pipeline.run().await?;
                self.output_message(&json!({
                    "ingest": serde_json::to_value(&report.ingest)?,
                    "uploaded": report.uploaded,
                    "tables": batch_summary(&report.tables),
                    "partitions": batch_summary(&report.partitions),
                }));
            }
            Commands::Ingest => {
                let summary = pipeline.download_prices().await?;
                self.output_message(&serde_json::to_value(&summary)?);
            }
            Commands::Upload => {
                let uploaded = pipeline.upload_files().await?;
                self.output_message(&json!({ "uploaded": uploaded }));
            }
            Commands::CreateTables => {
                let orchestrator = pipeline.query_orchestrator()?;
                let report = pipeline.create_tables(&orchestrator).await?;
                self.output_message(&batch_summary(&report));
            }
            Commands::RepairPartitions => {
                let orchestrator = pipeline.query_orchestrator()?;
                let report = pipeline.load_partitions(&orchestrator).await?;
                self.output_message(&batch_summary(&report));
            }
        }
        Ok(())
    }

    /// Load configuration: file (or defaults), then command-line overrides
    fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(folder) = &self.cli.price_folder {
            config.price_folder.clone_from(folder);
        }
        if let Some(folder) = &self.cli.ddl_folder {
            config.ddl_folder.clone_from(folder);
        }
        if let Some(database) = &self.cli.database {
            config.database.clone_from(database);
        }
        if let Some(bucket) = &self.cli.bucket {
            config.bucket.clone_from(bucket);
        }
        if let Some(endpoint) = &self.cli.query_endpoint {
            config.query_endpoint = Some(endpoint.clone());
        }

        config.validate()?;
        debug!("Configuration: {config:?}");
        Ok(config)
    }

    /// Load the offer filter, everything passes without one
    fn load_filter(&self) -> Result<OfferFilter> {
        match &self.cli.filter_file {
            Some(path) => OfferFilter::load(path),
            None => Ok(OfferFilter::default()),
        }
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        if self.cli.verbose {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        } else {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
    }
}

fn batch_summary(report: &BatchReport) -> Value {
    json!({
        "submitted": report.jobs.len(),
        "succeeded": report.succeeded().count(),
        "failed": report
            .failed()
            .map(|job| json!({
                "id": job.id.as_str(),
                "status": job.status.as_str(),
                "reason": job.reason,
            }))
            .collect::<Vec<_>>(),
        "polls": report.polls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::PathBuf;

    fn runner(args: &[&str]) -> Runner {
        Runner::new(Cli::parse_from(args))
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["price-lake"]);
        assert_eq!(cli.command, None);

        let cli = Cli::parse_from(["price-lake", "repair-partitions", "--verbose"]);
        assert_eq!(cli.command, Some(Commands::RepairPartitions));
        assert!(cli.verbose);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bucket: from-file\ndatabase: from-file\nddl_folder: /tmp/ddl").unwrap();

        let config = runner(&[
            "price-lake",
            "--config",
            file.path().to_str().unwrap(),
            "--bucket",
            "from-cli",
            "--query-endpoint",
            "http://localhost:9000",
            "ingest",
        ])
        .load_config()
        .unwrap();

        assert_eq!(config.bucket, "from-cli");
        assert_eq!(config.database, "from-file");
        assert_eq!(config.ddl_folder, PathBuf::from("/tmp/ddl"));
        assert_eq!(config.query_endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_empty_override_rejected() {
        let result = runner(&["price-lake", "--database", "", "ingest"]).load_config();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_filter_file() {
        let result = runner(&["price-lake", "--filter-file", "/nonexistent/filter.yaml"])
            .load_filter();
        assert!(matches!(result, Err(crate::Error::FileNotFound { .. })));
    }

    #[test]
    fn test_batch_summary() {
        let mut job = crate::query::QueryJob::submitted("q-1".into(), "SELECT 1");
        job.status = crate::query::QueryStatus::Failed;
        job.reason = Some("syntax".to_string());
        let report = BatchReport {
            jobs: vec![job],
            submission_batches: 1,
            polls: 4,
        };

        assert_eq!(
            batch_summary(&report),
            json!({
                "submitted": 1,
                "succeeded": 0,
                "failed": [{"id": "q-1", "status": "FAILED", "reason": "syntax"}],
                "polls": 4,
            })
        );
    }
}
