//! Query service seam and its HTTP implementation

use super::types::{JobId, JobStatusReport, QueryContext, QueryStatus, MAX_POLL_BATCH};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Submit/poll capability of a remote query service
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a query; returns once the service has accepted it
    async fn submit(&self, query: &str, context: &QueryContext) -> Result<JobId>;

    /// Fetch the state of up to [`MAX_POLL_BATCH`] jobs
    ///
    /// Jobs the service could not report on are simply absent.
    async fn poll_batch(&self, ids: &[JobId]) -> Result<Vec<JobStatusReport>>;
}

#[async_trait]
impl<T: QueryService + ?Sized> QueryService for Arc<T> {
    async fn submit(&self, query: &str, context: &QueryContext) -> Result<JobId> {
        (**self).submit(query, context).await
    }

    async fn poll_batch(&self, ids: &[JobId]) -> Result<Vec<JobStatusReport>> {
        (**self).poll_batch(ids).await
    }
}

// ============================================================================
// Athena JSON protocol
// ============================================================================

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const START_QUERY_EXECUTION: &str = "AmazonAthena.StartQueryExecution";
const BATCH_GET_QUERY_EXECUTION: &str = "AmazonAthena.BatchGetQueryExecution";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionRequest<'a> {
    query_string: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_execution_context: Option<ExecutionContext<'a>>,
    result_configuration: ResultConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExecutionContext<'a> {
    database: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResultConfiguration<'a> {
    output_location: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionResponse {
    query_execution_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BatchGetQueryExecutionRequest<'a> {
    query_execution_ids: &'a [JobId],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BatchGetQueryExecutionResponse {
    #[serde(default)]
    query_executions: Vec<QueryExecution>,
    #[serde(default)]
    unprocessed_query_execution_ids: Vec<UnprocessedId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecution {
    query_execution_id: String,
    status: ExecutionStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExecutionStatus {
    state: String,
    #[serde(default)]
    state_change_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UnprocessedId {
    query_execution_id: String,
    #[serde(default)]
    error_message: Option<String>,
}

/// Query service client speaking the Athena JSON 1.1 protocol
///
/// Request signing is left to whatever sits at `endpoint` (a signing proxy
/// or gateway); extra headers can be passed through the HTTP client config.
#[derive(Debug, Clone)]
pub struct HttpQueryService {
    http: HttpClient,
    endpoint: String,
}

impl HttpQueryService {
    /// Create a client for `endpoint`
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    fn request(target: &str, body: &impl Serialize) -> Result<RequestConfig> {
        Ok(RequestConfig::new()
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", target)
            .json(&serde_json::to_value(body)?))
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn submit(&self, query: &str, context: &QueryContext) -> Result<JobId> {
        let body = StartQueryExecutionRequest {
            query_string: query,
            query_execution_context: context
                .database
                .as_deref()
                .map(|database| ExecutionContext { database }),
            result_configuration: ResultConfiguration {
                output_location: &context.output_location,
            },
        };
        let response: StartQueryExecutionResponse = self
            .http
            .post_json(&self.endpoint, Self::request(START_QUERY_EXECUTION, &body)?)
            .await?;
        debug!("Submitted query {}", response.query_execution_id);
        Ok(JobId::from(response.query_execution_id))
    }

    async fn poll_batch(&self, ids: &[JobId]) -> Result<Vec<JobStatusReport>> {
        if ids.len() > MAX_POLL_BATCH {
            return Err(Error::query(format!(
                "cannot poll {} jobs at once, the limit is {MAX_POLL_BATCH}",
                ids.len()
            )));
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let body = BatchGetQueryExecutionRequest {
            query_execution_ids: ids,
        };
        let response: BatchGetQueryExecutionResponse = self
            .http
            .post_json(
                &self.endpoint,
                Self::request(BATCH_GET_QUERY_EXECUTION, &body)?,
            )
            .await?;

        for unprocessed in &response.unprocessed_query_execution_ids {
            warn!(
                "Status unavailable for {}: {}",
                unprocessed.query_execution_id,
                unprocessed.error_message.as_deref().unwrap_or("no reason given")
            );
        }

        Ok(response
            .query_executions
            .into_iter()
            .map(|execution| JobStatusReport {
                id: JobId::from(execution.query_execution_id),
                status: QueryStatus::parse(&execution.status.state),
                reason: execution.status.state_change_reason,
            })
            .collect())
    }
}
