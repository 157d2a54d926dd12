//! Query batch orchestrator
//!
//! Submission is sequential. The only suspension point besides the service
//! calls themselves is the fixed pause between two status polls.

use super::service::QueryService;
use super::types::{
    BatchReport, JobId, JobStatusReport, QueryContext, QueryJob, MAX_POLL_BATCH, REPAIR_GROUP_SIZE,
};
use crate::ddl::repair_statement;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// Pause between two status polls
#[async_trait]
pub trait Wait: Send + Sync {
    /// Block the flow of control for one polling interval
    async fn wait(&self);
}

/// Sleep a fixed interval
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval(pub Duration);

impl Default for FixedInterval {
    fn default() -> Self {
        Self(Duration::from_secs(2))
    }
}

#[async_trait]
impl Wait for FixedInterval {
    async fn wait(&self) {
        tokio::time::sleep(self.0).await;
    }
}

/// Do not wait at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWait;

#[async_trait]
impl Wait for NoWait {
    async fn wait(&self) {}
}

/// Drives batches of queries through a [`QueryService`]
#[derive(Debug)]
pub struct QueryBatchOrchestrator<S, W> {
    service: S,
    wait: W,
    context: QueryContext,
    group_size: usize,
}

impl<S: QueryService, W: Wait> QueryBatchOrchestrator<S, W> {
    /// Create an orchestrator submitting into `context`
    pub fn new(service: S, wait: W, context: QueryContext) -> Self {
        Self {
            service,
            wait,
            context,
            group_size: REPAIR_GROUP_SIZE,
        }
    }

    /// Change the chunked discipline's group size (minimum 1)
    #[must_use]
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size.max(1);
        self
    }

    /// Execution context of submitted queries
    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Bulk discipline: submit every query, then poll until all are terminal
    pub async fn run_bulk(&self, queries: &[String]) -> Result<BatchReport> {
        self.run_bulk_in(queries, &self.context).await
    }

    /// Bulk discipline with an explicit execution context
    pub async fn run_bulk_in(
        &self,
        queries: &[String],
        context: &QueryContext,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        if queries.is_empty() {
            return Ok(report);
        }

        let jobs = self.submit_all(queries, context).await?;
        report.submission_batches = 1;
        self.drain(jobs, &mut report).await?;
        Ok(report)
    }

    /// Chunked discipline: submit groups and drain each before the next
    pub async fn run_chunked(&self, queries: &[String]) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for group in queries.chunks(self.group_size) {
            let jobs = self.submit_all(group, &self.context).await?;
            report.submission_batches += 1;
            self.drain(jobs, &mut report).await?;
        }
        Ok(report)
    }

    /// Discover the partitions of each table, a few tables at a time
    pub async fn repair_partitions(&self, tables: &[String]) -> Result<BatchReport> {
        let statements: Vec<String> = tables.iter().map(|t| repair_statement(t)).collect();
        self.run_chunked(&statements).await
    }

    async fn submit_all(
        &self,
        queries: &[String],
        context: &QueryContext,
    ) -> Result<Vec<QueryJob>> {
        let mut jobs = Vec::with_capacity(queries.len());
        for query in queries {
            let id = self.service.submit(query, context).await?;
            info!("Started query {id}: {}", summarize(query));
            jobs.push(QueryJob::submitted(id, query.clone()));
        }
        Ok(jobs)
    }

    /// Poll until every job is terminal
    ///
    /// Each round polls the first [`MAX_POLL_BATCH`] outstanding jobs. Terminal
    /// jobs leave the set; polled jobs that are still running move behind the
    /// ones not polled yet, so every job gets its turn.
    async fn drain(&self, jobs: Vec<QueryJob>, report: &mut BatchReport) -> Result<()> {
        let mut outstanding = jobs;

        while !outstanding.is_empty() {
            let polled_count = outstanding.len().min(MAX_POLL_BATCH);
            let ids: Vec<JobId> = outstanding[..polled_count]
                .iter()
                .map(|j| j.id.clone())
                .collect();

            let statuses: HashMap<JobId, JobStatusReport> = self
                .service
                .poll_batch(&ids)
                .await?
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect();
            report.polls += 1;

            let rest = outstanding.split_off(polled_count);
            let mut still_running = Vec::with_capacity(polled_count);
            for mut job in outstanding {
                if let Some(status) = statuses.get(&job.id) {
                    job.status = status.status.clone();
                    job.reason.clone_from(&status.reason);
                }
                if job.status.is_terminal() {
                    log_finished(&job);
                    report.jobs.push(job);
                } else {
                    still_running.push(job);
                }
            }

            outstanding = rest;
            outstanding.extend(still_running);

            info!("Queries left: {}", outstanding.len());
            self.wait.wait().await;
        }
        Ok(())
    }
}

fn log_finished(job: &QueryJob) {
    if job.status.is_success() {
        info!("Query {} {}", job.id, job.status);
    } else {
        warn!(
            "Query {} {}: {}",
            job.id,
            job.status,
            job.reason.as_deref().unwrap_or("no reason given")
        );
    }
}

/// First line of a query, for logs
fn summarize(query: &str) -> &str {
    query.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}
