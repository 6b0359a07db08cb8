//! Report job scheduler.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::builder::{BuildContext, run_build};
use super::source::ReportDataSource;
use crate::jobs::{JobState, JobStore, ReportFormat, ReportParams, ReportType, TicketKey};
use crate::storage::ArtifactStore;

/// Execution discipline for a report build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Fire-and-forget: the build runs on a spawned task and the caller
    /// never blocks on generation.
    Spawned,
    /// The build is awaited within the caller, still reporting through the
    /// same ticket/polling contract.
    Inline,
}

/// A report request as accepted from the client.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Raw format value; aliases are normalized during validation.
    pub format: String,
    /// Tenant scope.
    pub company_id: i64,
    /// Report-specific filter parameters.
    pub params: ReportParams,
}

/// Scheduling failure: the request never produces a ticket.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Invalid input parameters.
    #[error("{0}")]
    Validation(String),
}

/// The single entry point that turns a report request into a trackable,
/// asynchronous unit of work.
#[derive(Clone)]
pub struct ReportScheduler {
    jobs: Arc<JobStore>,
    artifacts: Arc<ArtifactStore>,
    source: Arc<dyn ReportDataSource>,
}

impl ReportScheduler {
    /// Creates a scheduler over the shared stores and data source.
    #[must_use]
    pub fn new(
        jobs: Arc<JobStore>,
        artifacts: Arc<ArtifactStore>,
        source: Arc<dyn ReportDataSource>,
    ) -> Self {
        Self {
            jobs,
            artifacts,
            source,
        }
    }

    /// The job status store this scheduler seeds.
    #[must_use]
    pub fn jobs(&self) -> &Arc<JobStore> {
        &self.jobs
    }

    /// Accepts a report request and returns its ticket.
    ///
    /// Validation happens before any ticket is minted; each call mints a
    /// fresh ticket (identical concurrent requests are not coalesced).
    /// Under [`Dispatch::Spawned`] the returned ticket never waits on
    /// generation.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Validation`] for unknown formats, missing
    /// or out-of-order date ranges, and invalid periods.
    pub async fn start(
        &self,
        report_type: ReportType,
        request: ReportRequest,
        dispatch: Dispatch,
    ) -> Result<Uuid, ScheduleError> {
        let format = ReportFormat::parse(&request.format)
            .ok_or_else(|| ScheduleError::Validation(format!("unknown format '{}'", request.format)))?;
        let params = request
            .params
            .normalized()
            .map_err(ScheduleError::Validation)?;

        let ticket = Uuid::new_v4();
        let key = TicketKey::new(report_type, ticket);
        self.jobs.seed(
            key,
            JobState::queued(format, params.clone(), request.company_id),
        );

        info!(
            report = report_type.slug(),
            %ticket,
            company_id = request.company_id,
            format = format.as_str(),
            "report job accepted"
        );

        let ctx = BuildContext {
            jobs: Arc::clone(&self.jobs),
            artifacts: Arc::clone(&self.artifacts),
            source: Arc::clone(&self.source),
            key,
            company_id: request.company_id,
            format,
            params,
        };

        match dispatch {
            Dispatch::Spawned => {
                tokio::spawn(run_build(ctx));
            }
            Dispatch::Inline => run_build(ctx).await,
        }

        Ok(ticket)
    }
}
