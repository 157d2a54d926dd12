//! Pipeline stages

use super::types::{IngestSummary, OfferSummary, RunReport};
use crate::catalog::CatalogClient;
use crate::config::{OfferFilter, PipelineConfig};
use crate::ddl::{create_database_statement, table_name_from_file};
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, HttpClientConfig};
use crate::output::{CloudDestination, PartitionedWriter};
use crate::query::{
    BatchReport, FixedInterval, HttpQueryService, QueryBatchOrchestrator, QueryContext,
    QueryService, Wait,
};
use crate::source::RowSource;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The price pipeline
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    filter: OfferFilter,
    catalog: CatalogClient,
}

impl Pipeline {
    /// Create a pipeline for `config`, processing the offers `filter` allows
    pub fn new(config: PipelineConfig, filter: OfferFilter) -> Result<Self> {
        let catalog = CatalogClient::new(
            HttpClient::new()?,
            config.prefix.clone(),
            config.price_url.clone(),
        );
        Ok(Self {
            config,
            filter,
            catalog,
        })
    }

    /// Orchestrator talking to the configured query endpoint
    pub fn query_orchestrator(
        &self,
    ) -> Result<QueryBatchOrchestrator<HttpQueryService, FixedInterval>> {
        let endpoint = self.config.require_query_endpoint()?;
        let http = HttpClient::with_config(
            HttpClientConfig::builder()
                .headers(&self.config.query_headers)
                .build(),
        )?;
        Ok(QueryBatchOrchestrator::new(
            HttpQueryService::new(http, endpoint),
            FixedInterval(self.config.poll_interval()),
            QueryContext::new(&self.config.database, self.config.output_location()),
        ))
    }

    /// Download every selected offer and write its partitions and table definition
    pub async fn download_prices(&self) -> Result<IngestSummary> {
        let index = self.catalog.fetch_index().await?;
        let mut writer = PartitionedWriter::new(&self.config.price_folder);
        let mut summary = IngestSummary::default();

        for (code, entry) in &index.offers {
            if !self.filter.allows(code) {
                debug!("Skipping offer {code}");
                summary.skipped.push(code.clone());
                continue;
            }

            let url = entry.csv_url(self.catalog.prefix());
            let offer = self
                .catalog
                .download_offer(code, &url, &self.config.download_folder)
                .await?;

            let rows = RowSource::open(code.as_str(), &offer.source_path)?;
            match writer.write_offer(code, rows)? {
                Some(layout) => {
                    let definition = layout
                        .table_definition(&self.config.bucket)
                        .write_to(&self.config.ddl_folder)?;
                    info!(
                        "Wrote {code} version {}: {} rows in {} partitions",
                        offer.version.as_deref().unwrap_or("unknown"),
                        layout.rows(),
                        layout.partitions.len()
                    );
                    summary
                        .offers
                        .push(OfferSummary::new(&offer, &layout, definition));
                }
                None => {
                    warn!("Offer {code} has no rows, no table definition written");
                    summary.empty.push(code.clone());
                }
            }

            tokio::fs::remove_file(&offer.source_path).await?;
        }

        summary.location_index = writer.into_location_index();
        if let Some(path) = &self.config.location_index {
            write_json(path, &summary.location_index)?;
            info!("Wrote location index to {}", path.display());
        }

        info!(
            "Ingested {} offers, {} rows, {} partitions",
            summary.offers.len(),
            summary.rows(),
            summary.partitions()
        );
        Ok(summary)
    }

    /// Upload the partition tree to the destination
    pub async fn upload_files(&self) -> Result<usize> {
        let destination = CloudDestination::parse(&self.config.destination_url())?;
        let uploaded = destination.upload_dir(&self.config.price_folder).await?;
        info!(
            "Uploaded {uploaded} files to {}",
            self.config.destination_url()
        );
        Ok(uploaded)
    }

    /// Create the database, then every table with a definition file
    ///
    /// All table queries are submitted before the first poll.
    pub async fn create_tables<S: QueryService, W: Wait>(
        &self,
        orchestrator: &QueryBatchOrchestrator<S, W>,
    ) -> Result<BatchReport> {
        let bootstrap = orchestrator
            .run_bulk_in(
                &[create_database_statement(&self.config.database)],
                &orchestrator.context().without_database(),
            )
            .await?;
        if !bootstrap.all_succeeded() {
            return Err(Error::query(format!(
                "could not create database {}",
                self.config.database
            )));
        }

        let mut statements = Vec::new();
        for path in self.definition_files()? {
            let statement = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            statements.push(statement);
        }
        info!("Creating {} tables", statements.len());

        let mut report = bootstrap;
        report.merge(orchestrator.run_bulk(&statements).await?);
        log_failures(&report);
        Ok(report)
    }

    /// Discover the partitions of every table with a definition file
    pub async fn load_partitions<S: QueryService, W: Wait>(
        &self,
        orchestrator: &QueryBatchOrchestrator<S, W>,
    ) -> Result<BatchReport> {
        let tables: Vec<String> = self
            .definition_files()?
            .iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let table = table_name_from_file(name);
                if table.is_none() {
                    debug!("Not a table definition: {}", path.display());
                }
                table
            })
            .collect();
        info!("Loading partitions of {} tables", tables.len());

        let report = orchestrator.repair_partitions(&tables).await?;
        log_failures(&report);
        Ok(report)
    }

    /// Run every stage against the configured query endpoint
    pub async fn run(&self) -> Result<RunReport> {
        let orchestrator = self.query_orchestrator()?;
        self.run_with(&orchestrator).await
    }

    /// Run every stage with the given orchestrator
    pub async fn run_with<S: QueryService, W: Wait>(
        &self,
        orchestrator: &QueryBatchOrchestrator<S, W>,
    ) -> Result<RunReport> {
        let ingest = self.download_prices().await?;
        let uploaded = self.upload_files().await?;
        let tables = self.create_tables(orchestrator).await?;
        let partitions = self.load_partitions(orchestrator).await?;
        Ok(RunReport {
            ingest,
            uploaded,
            tables,
            partitions,
        })
    }

    /// Files in the definition folder, sorted by name
    fn definition_files(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.ddl_folder;
        if !dir.is_dir() {
            return Err(Error::FileNotFound {
                path: dir.display().to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

fn log_failures(report: &BatchReport) {
    let failed = report.failed().count();
    if failed > 0 {
        warn!("{failed} of {} queries did not succeed", report.jobs.len());
    }
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}
