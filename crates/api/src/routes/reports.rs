//! Ticket-based report API.
//!
//! Uniform surface across all report types: start a build, poll its
//! status, download or view the finished artifact. Tenant scope is the
//! explicit `company_id` parameter and is enforced on every endpoint.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use canebooks_core::jobs::{
    JobAccessError, JobState, JobStatus, ReportFormat, ReportParams, ReportType, TicketKey,
};
use canebooks_core::pipeline::{Dispatch, ReportRequest, ScheduleError};
use canebooks_core::storage::StorageError;
use canebooks_shared::AppError;

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{report_type}/report", post(start_report))
        .route("/{report_type}/report/{ticket}/status", get(report_status))
        .route(
            "/{report_type}/report/{ticket}/download",
            get(download_report),
        )
        .route("/{report_type}/report/{ticket}/view", get(view_report))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for starting a report build.
#[derive(Debug, Deserialize)]
pub struct StartReportRequest {
    /// Tenant scope (required).
    pub company_id: Option<i64>,
    /// Output format: pdf | xls | xlsx | excel.
    pub format: Option<String>,
    /// Range start (YYYY-MM-DD).
    pub start_date: Option<NaiveDate>,
    /// Range end (YYYY-MM-DD).
    pub end_date: Option<NaiveDate>,
    /// Account-code range start.
    pub account_from: Option<String>,
    /// Account-code range end.
    pub account_to: Option<String>,
    /// Period month (1-12), alternative to explicit dates.
    pub period_month: Option<u32>,
    /// Period year, alternative to explicit dates.
    pub period_year: Option<i32>,
    /// Free-text filter.
    pub query: Option<String>,
}

/// Query parameters for ticket-touching endpoints.
#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    /// Tenant scope (required).
    pub company_id: Option<i64>,
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_report_type(slug: &str) -> Result<ReportType, ApiError> {
    ReportType::parse_slug(slug)
        .ok_or_else(|| AppError::NotFound(format!("unknown report type '{slug}'")).into())
}

fn require_company(company_id: Option<i64>) -> Result<i64, ApiError> {
    company_id.ok_or_else(|| AppError::Validation("company_id is required".to_string()).into())
}

fn scoped_state(
    state: &AppState,
    report_type: ReportType,
    ticket: Uuid,
    company_id: i64,
) -> Result<std::sync::Arc<JobState>, ApiError> {
    let key = TicketKey::new(report_type, ticket);
    state.jobs.get_scoped(&key, company_id).map_err(|e| match e {
        JobAccessError::NotFound => {
            AppError::NotFound(format!("unknown or expired ticket {ticket}")).into()
        }
        JobAccessError::Forbidden => {
            AppError::Forbidden("ticket belongs to a different company".to_string()).into()
        }
    })
}

/// Loads the finished artifact for a ticket, or the precise failure.
async fn finished_artifact(
    state: &AppState,
    job: &JobState,
) -> Result<(Vec<u8>, String), ApiError> {
    if job.status != JobStatus::Done {
        return Err(AppError::Conflict("report is not ready".to_string()).into());
    }
    let file = job
        .file
        .clone()
        .ok_or_else(|| AppError::Internal("finished job has no artifact reference".to_string()))?;

    let bytes = state.artifacts.read(&file).await.map_err(|e| match e {
        StorageError::NotFound { .. } => {
            ApiError::from(AppError::Gone("report artifact is no longer available".to_string()))
        }
        other => ApiError::from(AppError::Storage(other.to_string())),
    })?;

    let filename = job
        .filename
        .clone()
        .unwrap_or_else(|| format!("report.{}", job.format.extension()));
    Ok((bytes, filename))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/{report-type}/report` - accept a report request, return a ticket.
async fn start_report(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
    Json(body): Json<StartReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report_type = parse_report_type(&report_type)?;
    let company_id = require_company(body.company_id)?;
    let format = body
        .format
        .ok_or_else(|| AppError::Validation("format is required".to_string()))?;

    let request = ReportRequest {
        format,
        company_id,
        params: ReportParams {
            start_date: body.start_date,
            end_date: body.end_date,
            account_from: body.account_from,
            account_to: body.account_to,
            period_month: body.period_month,
            period_year: body.period_year,
            query: body.query,
        },
    };

    let ticket = state
        .scheduler
        .start(report_type, request, Dispatch::Spawned)
        .await
        .map_err(|ScheduleError::Validation(msg)| AppError::Validation(msg))?;

    Ok((StatusCode::OK, Json(json!({ "ticket": ticket }))))
}

/// GET `/{report-type}/report/{ticket}/status` - poll the job state.
async fn report_status(
    State(state): State<AppState>,
    Path((report_type, ticket)): Path<(String, Uuid)>,
    Query(query): Query<TicketQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report_type = parse_report_type(&report_type)?;
    let company_id = require_company(query.company_id)?;

    let job = scoped_state(&state, report_type, ticket, company_id)?;
    Ok(Json((*job).clone()))
}

/// GET `/{report-type}/report/{ticket}/download` - fetch the artifact.
async fn download_report(
    State(state): State<AppState>,
    Path((report_type, ticket)): Path<(String, Uuid)>,
    Query(query): Query<TicketQuery>,
) -> Result<Response, ApiError> {
    let report_type = parse_report_type(&report_type)?;
    let company_id = require_company(query.company_id)?;

    let job = scoped_state(&state, report_type, ticket, company_id)?;
    let (bytes, filename) = finished_artifact(&state, &job).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, job.format.mime().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET `/{report-type}/report/{ticket}/view` - inline view, PDF only.
async fn view_report(
    State(state): State<AppState>,
    Path((report_type, ticket)): Path<(String, Uuid)>,
    Query(query): Query<TicketQuery>,
) -> Result<Response, ApiError> {
    let report_type = parse_report_type(&report_type)?;
    let company_id = require_company(query.company_id)?;

    let job = scoped_state(&state, report_type, ticket, company_id)?;
    if job.format != ReportFormat::Pdf {
        return Err(AppError::UnsupportedMedia(
            "inline view is only available for PDF reports".to_string(),
        )
        .into());
    }
    let (bytes, filename) = finished_artifact(&state, &job).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, job.format.mime().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
