//! Query job types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Most identifiers the query service accepts in one status call
pub const MAX_POLL_BATCH: usize = 50;

/// Jobs in flight at once under the chunked discipline
pub const REPAIR_GROUP_SIZE: usize = 3;

/// Identifier the query service assigns to a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a raw identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// State of a remote query job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Accepted, not started
    Queued,
    /// Executing
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed,
    /// Cancelled by someone
    Cancelled,
    /// Any other state reported by the service, treated as terminal
    Other(String),
}

impl QueryStatus {
    /// Parse a service state string
    pub fn parse(state: &str) -> Self {
        match state {
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    /// State string as the service spells it
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Other(s) => s,
        }
    }

    /// Whether no further state change is expected
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Running)
    }

    /// Whether the job finished successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one job as returned by a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    /// Job identifier
    pub id: JobId,
    /// Current state
    pub status: QueryStatus,
    /// Service-provided explanation, mostly for failures
    pub reason: Option<String>,
}

impl JobStatusReport {
    /// Create a report without a reason
    pub fn new(id: impl Into<JobId>, status: QueryStatus) -> Self {
        Self {
            id: id.into(),
            status,
            reason: None,
        }
    }
}

/// A submitted job tracked by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryJob {
    /// Job identifier
    pub id: JobId,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
    /// Last known state
    pub status: QueryStatus,
    /// Submitted query text
    pub query: String,
    /// Failure explanation, when the service gave one
    pub reason: Option<String>,
}

impl QueryJob {
    /// A freshly submitted job
    pub fn submitted(id: JobId, query: impl Into<String>) -> Self {
        Self {
            id,
            submitted_at: Utc::now(),
            status: QueryStatus::Queued,
            query: query.into(),
            reason: None,
        }
    }
}

/// Where and how submitted queries execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    /// Database the query runs in, `None` for database-level statements
    pub database: Option<String>,
    /// Result location for the service (e.g. `s3://bucket/query_results`)
    pub output_location: String,
}

impl QueryContext {
    /// Context bound to a database
    pub fn new(database: impl Into<String>, output_location: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            output_location: output_location.into(),
        }
    }

    /// Same context without a database, for `CREATE DATABASE` and friends
    #[must_use]
    pub fn without_database(&self) -> Self {
        Self {
            database: None,
            output_location: self.output_location.clone(),
        }
    }
}

/// Outcome of one orchestrator run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Jobs in the order they reached a terminal state
    pub jobs: Vec<QueryJob>,
    /// Number of submission batches
    pub submission_batches: usize,
    /// Number of status polls
    pub polls: usize,
}

impl BatchReport {
    /// Jobs that succeeded
    pub fn succeeded(&self) -> impl Iterator<Item = &QueryJob> {
        self.jobs.iter().filter(|j| j.status.is_success())
    }

    /// Jobs that ended in any other terminal state
    pub fn failed(&self) -> impl Iterator<Item = &QueryJob> {
        self.jobs.iter().filter(|j| !j.status.is_success())
    }

    /// Whether every job succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: BatchReport) {
        self.jobs.extend(other.jobs);
        self.submission_batches += other.submission_batches;
        self.polls += other.polls;
    }
}
