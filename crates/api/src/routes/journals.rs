//! Journal mutation routes.
//!
//! The surface that exercises the balance engine and the approval gate.
//! Detail mutations on a posted record must pass the gate before any
//! write; the repository then re-syncs the bank row and cached totals
//! atomically with the mutation.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use canebooks_core::approval::ApprovalAction;
use canebooks_core::journal::JournalKind;
use canebooks_db::repositories::journal::{
    CreateHeaderInput, DetailPatch, HeaderWithDetails, NewDetail,
};
use canebooks_db::{ApprovalRepository, JournalRepository};
use canebooks_shared::AppError;

/// Creates the journal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journals/{kind}", post(create_header))
        .route("/journals/{kind}/{id}", get(get_transaction))
        .route("/journals/{kind}/{id}/details", post(add_detail))
        .route(
            "/journals/{kind}/{id}/details/{detail_id}",
            axum::routing::patch(update_detail).delete(remove_detail),
        )
        .route("/journals/{kind}/{id}/cancel", post(cancel_record))
        .route("/journals/{kind}/{id}/post", post(post_record))
        .route("/journals/{kind}/{id}/unpost", post(unpost_record))
        .route(
            "/journals/{kind}/{id}/release-approval",
            post(release_approval),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a transaction header.
#[derive(Debug, Deserialize)]
pub struct CreateHeaderRequest {
    /// Tenant scope (required).
    pub company_id: Option<i64>,
    /// Transaction date.
    pub doc_date: NaiveDate,
    /// Customer/vendor reference, per module.
    pub counterparty_id: Option<i64>,
    /// Selected bank, cash modules only.
    pub bank_id: Option<i64>,
    /// Check number, cash disbursements only.
    pub check_no: Option<String>,
    /// Free-text explanation.
    #[serde(default)]
    pub explanation: String,
}

/// Request body for adding a detail line.
#[derive(Debug, Deserialize)]
pub struct AddDetailRequest {
    /// Tenant scope (required).
    pub company_id: Option<i64>,
    /// Account code to post to.
    pub acct_code: String,
    /// Debit amount.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount.
    #[serde(default)]
    pub credit: Decimal,
}

/// Request body for rewriting a detail line.
#[derive(Debug, Deserialize)]
pub struct UpdateDetailRequest {
    /// Tenant scope (required).
    pub company_id: Option<i64>,
    /// Replacement account code, when changing it.
    pub acct_code: Option<String>,
    /// Replacement debit amount.
    #[serde(default)]
    pub debit: Decimal,
    /// Replacement credit amount.
    #[serde(default)]
    pub credit: Decimal,
}

/// Request body carrying only the tenant scope.
#[derive(Debug, Deserialize)]
pub struct ScopeRequest {
    /// Tenant scope (required).
    pub company_id: Option<i64>,
}

/// Query parameters carrying only the tenant scope.
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    /// Tenant scope (required).
    pub company_id: Option<i64>,
}

/// Response for a transaction with details.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Formatted document reference, e.g. `CR-000042`.
    pub doc_ref: String,
    /// Transaction date.
    pub doc_date: String,
    /// Counterparty reference.
    pub counterparty_id: Option<i64>,
    /// Selected bank.
    pub bank_id: Option<i64>,
    /// Check number.
    pub check_no: Option<String>,
    /// Explanation.
    pub explanation: String,
    /// Logical record state.
    pub state: String,
    /// Whether the record is posted (locked).
    pub posted: bool,
    /// Cached debit total.
    pub sum_debit: String,
    /// Cached credit total.
    pub sum_credit: String,
    /// Legacy mirrored amount.
    pub amount: String,
    /// Whether debits equal credits within tolerance.
    pub is_balanced: bool,
    /// Detail lines.
    pub details: Vec<DetailResponse>,
}

/// Response for a detail line.
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    /// Detail ID.
    pub id: Uuid,
    /// Account code.
    pub acct_code: String,
    /// Debit amount.
    pub debit: String,
    /// Credit amount.
    pub credit: String,
    /// Whether this is the system-maintained bank row.
    pub bank_row: bool,
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_kind(slug: &str) -> Result<JournalKind, ApiError> {
    JournalKind::parse(slug)
        .ok_or_else(|| AppError::NotFound(format!("unknown journal '{slug}'")).into())
}

fn require_company(company_id: Option<i64>) -> Result<i64, ApiError> {
    company_id.ok_or_else(|| AppError::Validation("company_id is required".to_string()).into())
}

fn format_money(amount: Decimal) -> String {
    format!("{amount:.2}")
}

fn to_response(kind: JournalKind, record: HeaderWithDetails) -> TransactionResponse {
    let header = record.header;
    let state = kind
        .decode_state(&header.cancel_flag)
        .map_or("unknown", |s| match s {
            canebooks_core::journal::RecordState::Active => "active",
            canebooks_core::journal::RecordState::Cancelled => "cancelled",
            canebooks_core::journal::RecordState::Deleted => "deleted",
        });

    TransactionResponse {
        id: header.id,
        doc_ref: kind.format_doc_no(header.doc_no),
        doc_date: header.doc_date.to_string(),
        counterparty_id: header.counterparty_id,
        bank_id: header.bank_id,
        check_no: header.check_no,
        explanation: header.explanation,
        state: state.to_string(),
        posted: header.posted,
        sum_debit: format_money(header.sum_debit),
        sum_credit: format_money(header.sum_credit),
        amount: format_money(header.amount),
        is_balanced: header.is_balanced,
        details: record
            .details
            .into_iter()
            .map(|d| DetailResponse {
                id: d.id,
                acct_code: d.acct_code.clone(),
                debit: format_money(d.debit),
                credit: format_money(d.credit),
                bank_row: d.is_bank_row(),
            })
            .collect(),
    }
}

/// Runs the approval gate when the record is posted.
///
/// The gate runs before any write; an unposted record needs no approval.
async fn gate_posted_edit(
    state: &AppState,
    kind: JournalKind,
    id: Uuid,
    company_id: i64,
) -> Result<(), ApiError> {
    let journals = JournalRepository::new((*state.db).clone());
    let record = journals.find(kind, id, company_id).await?;

    if record.header.posted {
        let approvals = ApprovalRepository::new((*state.db).clone());
        approvals
            .require_approved(kind, id, company_id, ApprovalAction::Edit)
            .await?;
    }
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/journals/{kind}` - create a header with zero totals.
async fn create_header(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<CreateHeaderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(body.company_id)?;

    let journals = JournalRepository::new((*state.db).clone());
    let header = journals
        .create_header(CreateHeaderInput {
            company_id,
            kind,
            doc_date: body.doc_date,
            counterparty_id: body.counterparty_id,
            bank_id: body.bank_id,
            check_no: body.check_no,
            explanation: body.explanation,
        })
        .await?;

    let record = journals.find(kind, header.id, company_id).await?;
    Ok((StatusCode::CREATED, Json(to_response(kind, record))))
}

/// GET `/journals/{kind}/{id}` - header with details and derived totals.
async fn get_transaction(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Query(query): Query<ScopeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(query.company_id)?;

    let journals = JournalRepository::new((*state.db).clone());
    let record = journals.find(kind, id, company_id).await?;
    Ok(Json(to_response(kind, record)))
}

/// POST `/journals/{kind}/{id}/details` - add a line, recompute totals.
async fn add_detail(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(body): Json<AddDetailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(body.company_id)?;
    gate_posted_edit(&state, kind, id, company_id).await?;

    let journals = JournalRepository::new((*state.db).clone());
    let record = journals
        .add_detail(
            kind,
            id,
            company_id,
            NewDetail {
                acct_code: body.acct_code,
                debit: body.debit,
                credit: body.credit,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(kind, record))))
}

/// PATCH `/journals/{kind}/{id}/details/{detail_id}` - rewrite a line.
async fn update_detail(
    State(state): State<AppState>,
    Path((kind, id, detail_id)): Path<(String, Uuid, Uuid)>,
    Json(body): Json<UpdateDetailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(body.company_id)?;
    gate_posted_edit(&state, kind, id, company_id).await?;

    let journals = JournalRepository::new((*state.db).clone());
    let record = journals
        .update_detail(
            kind,
            id,
            detail_id,
            company_id,
            DetailPatch {
                acct_code: body.acct_code,
                debit: body.debit,
                credit: body.credit,
            },
        )
        .await?;

    Ok(Json(to_response(kind, record)))
}

/// DELETE `/journals/{kind}/{id}/details/{detail_id}` - remove a line.
async fn remove_detail(
    State(state): State<AppState>,
    Path((kind, id, detail_id)): Path<(String, Uuid, Uuid)>,
    Query(query): Query<ScopeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(query.company_id)?;
    gate_posted_edit(&state, kind, id, company_id).await?;

    let journals = JournalRepository::new((*state.db).clone());
    let record = journals.remove_detail(kind, id, detail_id, company_id).await?;
    Ok(Json(to_response(kind, record)))
}

/// POST `/journals/{kind}/{id}/cancel` - soft cancel, details retained.
async fn cancel_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(body): Json<ScopeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(body.company_id)?;

    let journals = JournalRepository::new((*state.db).clone());
    journals.cancel(kind, id, company_id).await?;
    let record = journals.find(kind, id, company_id).await?;
    Ok(Json(to_response(kind, record)))
}

/// POST `/journals/{kind}/{id}/post` - lock the record.
async fn post_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(body): Json<ScopeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(body.company_id)?;

    let journals = JournalRepository::new((*state.db).clone());
    journals.set_posted(kind, id, company_id, true).await?;
    let record = journals.find(kind, id, company_id).await?;
    Ok(Json(to_response(kind, record)))
}

/// POST `/journals/{kind}/{id}/unpost` - unlock, gated by an unpost
/// approval.
async fn unpost_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(body): Json<ScopeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(body.company_id)?;

    let approvals = ApprovalRepository::new((*state.db).clone());
    approvals
        .require_approved(kind, id, company_id, ApprovalAction::Unpost)
        .await?;

    let journals = JournalRepository::new((*state.db).clone());
    journals.set_posted(kind, id, company_id, false).await?;
    let record = journals.find(kind, id, company_id).await?;
    Ok(Json(to_response(kind, record)))
}

/// POST `/journals/{kind}/{id}/release-approval` - end the edit session.
async fn release_approval(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(body): Json<ScopeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&kind)?;
    let company_id = require_company(body.company_id)?;

    let approvals = ApprovalRepository::new((*state.db).clone());
    approvals.release(kind, id, company_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
