//! Data source abstraction for report queries.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::journal::JournalKind;
use crate::reports::{AccountSummary, CheckRow, LedgerRow};

/// Failure while querying ledger data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying query failed.
    #[error("ledger query failed: {0}")]
    Query(String),
}

/// Read-only ledger access for the report builder.
///
/// Implementations must scope every query, including display-name joins,
/// to the given `company_id`; reports never mutate ledger data.
#[async_trait]
pub trait ReportDataSource: Send + Sync {
    /// Detail rows of active transactions in the date range, restricted to
    /// the given journal modules and optional account-code range.
    async fn ledger_rows(
        &self,
        company_id: i64,
        kinds: &[JournalKind],
        start: NaiveDate,
        end: NaiveDate,
        account_from: Option<&str>,
        account_to: Option<&str>,
    ) -> Result<Vec<LedgerRow>, SourceError>;

    /// Per-account debit/credit totals over the date range, across all
    /// journal modules.
    async fn account_summaries(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AccountSummary>, SourceError>;

    /// Issued checks in the date range.
    async fn check_rows(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CheckRow>, SourceError>;
}
