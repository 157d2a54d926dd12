//! Query batch module
//!
//! Drives remote, long-running query jobs to completion.
//!
//! # Overview
//!
//! - [`QueryService`] - the submit/poll seam of the remote query service,
//!   with [`HttpQueryService`] speaking the Athena JSON protocol
//! - [`QueryBatchOrchestrator`] - two submission disciplines sharing one
//!   polling loop:
//!   - bulk: submit everything, then poll until every job is terminal
//!   - chunked: submit groups of 3 and drain each group before the next
//! - [`Wait`] - the pause between polls, injectable for tests
//!
//! Status polls never carry more than [`MAX_POLL_BATCH`] identifiers.
//! Failed jobs end polling like successful ones; they are reported in the
//! [`BatchReport`], not raised as errors.

mod orchestrator;
mod service;
mod types;

pub use orchestrator::{FixedInterval, NoWait, QueryBatchOrchestrator, Wait};
pub use service::{HttpQueryService, QueryService};
pub use types::{
    BatchReport, JobId, JobStatusReport, QueryContext, QueryJob, QueryStatus, MAX_POLL_BATCH,
    REPAIR_GROUP_SIZE,
};
