//! Report job domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::journal::JournalKind;

/// The report a job builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Per-account running balances over a date/account range.
    GeneralLedger,
    /// Debit/credit totals per account, bucketed by statement category.
    TrialBalance,
    /// Chronological listing of issued checks.
    CheckRegister,
    /// Chronological cash receipts book.
    CashReceiptBook,
    /// Chronological cash disbursements book.
    CashDisbursementBook,
    /// Chronological general journal book.
    GeneralJournalBook,
    /// Accounts payable journal (purchases).
    PayableJournal,
    /// Accounts receivable journal (sales).
    ReceivableJournal,
}

impl ReportType {
    /// All report types.
    pub const ALL: [Self; 8] = [
        Self::GeneralLedger,
        Self::TrialBalance,
        Self::CheckRegister,
        Self::CashReceiptBook,
        Self::CashDisbursementBook,
        Self::GeneralJournalBook,
        Self::PayableJournal,
        Self::ReceivableJournal,
    ];

    /// URL path segment for this report type.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::GeneralLedger => "general-ledger",
            Self::TrialBalance => "trial-balance",
            Self::CheckRegister => "check-register",
            Self::CashReceiptBook => "cash-receipt-book",
            Self::CashDisbursementBook => "cash-disbursement-book",
            Self::GeneralJournalBook => "general-journal-book",
            Self::PayableJournal => "payable-journal",
            Self::ReceivableJournal => "receivable-journal",
        }
    }

    /// Parses a URL path segment.
    #[must_use]
    pub fn parse_slug(s: &str) -> Option<Self> {
        match s {
            "general-ledger" => Some(Self::GeneralLedger),
            "trial-balance" => Some(Self::TrialBalance),
            "check-register" => Some(Self::CheckRegister),
            "cash-receipt-book" => Some(Self::CashReceiptBook),
            "cash-disbursement-book" => Some(Self::CashDisbursementBook),
            "general-journal-book" => Some(Self::GeneralJournalBook),
            "payable-journal" => Some(Self::PayableJournal),
            "receivable-journal" => Some(Self::ReceivableJournal),
            _ => None,
        }
    }

    /// Human-readable report title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::GeneralLedger => "General Ledger",
            Self::TrialBalance => "Trial Balance",
            Self::CheckRegister => "Check Register",
            Self::CashReceiptBook => "Cash Receipt Book",
            Self::CashDisbursementBook => "Cash Disbursement Book",
            Self::GeneralJournalBook => "General Journal Book",
            Self::PayableJournal => "Accounts Payable Journal",
            Self::ReceivableJournal => "Accounts Receivable Journal",
        }
    }

    /// Journal modules whose rows feed this report, when it is row-based.
    #[must_use]
    pub fn source_kinds(&self) -> &'static [JournalKind] {
        match self {
            Self::GeneralLedger => &JournalKind::ALL,
            Self::TrialBalance => &JournalKind::ALL,
            Self::CheckRegister | Self::CashDisbursementBook => &[JournalKind::CashDisbursement],
            Self::CashReceiptBook => &[JournalKind::CashReceipt],
            Self::GeneralJournalBook => &[JournalKind::GeneralAccounting],
            Self::PayableJournal => &[JournalKind::CashPurchase],
            Self::ReceivableJournal => &[JournalKind::CashSales],
        }
    }

    /// Whether the builder refuses to render when the aggregate debit and
    /// credit totals disagree.
    ///
    /// Full-transaction reports must balance; the general ledger (account
    /// range filter) and check register (one-sided listing) cannot satisfy
    /// the invariant by construction and are exempt.
    #[must_use]
    pub fn requires_balanced_aggregate(&self) -> bool {
        !matches!(self, Self::GeneralLedger | Self::CheckRegister)
    }
}

/// Canonical artifact format family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// PDF family (supports inline viewing).
    Pdf,
    /// Spreadsheet family.
    Xls,
}

impl ReportFormat {
    /// Normalizes a client-supplied format alias.
    ///
    /// `excel` and `xlsx` collapse deterministically into the canonical
    /// `xls`; the canonical value drives both the stored job state and the
    /// artifact extension.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "xls" | "xlsx" | "excel" => Some(Self::Xls),
            _ => None,
        }
    }

    /// Canonical name, as stored in job state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xls => "xls",
        }
    }

    /// File extension for generated artifacts.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// MIME type for download responses.
    #[must_use]
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xls => "application/vnd.ms-excel",
        }
    }
}

/// Report job lifecycle status.
///
/// `Queued -> Running -> {Done, Error}`; terminal states never transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet started.
    Queued,
    /// Building.
    Running,
    /// Finished; the artifact is retrievable.
    Done,
    /// Failed; `error` carries the reason.
    Error,
}

impl JobStatus {
    /// Whether this status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Client-supplied report parameters, echoed into the job state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParams {
    /// Range start (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Range end (inclusive).
    pub end_date: Option<NaiveDate>,
    /// Account-code range start (inclusive), where applicable.
    pub account_from: Option<String>,
    /// Account-code range end (inclusive), where applicable.
    pub account_to: Option<String>,
    /// Period month (1-12), alternative to an explicit date range.
    pub period_month: Option<u32>,
    /// Period year, alternative to an explicit date range.
    pub period_year: Option<i32>,
    /// Free-text filter.
    pub query: Option<String>,
}

impl ReportParams {
    /// Resolves the effective date range.
    ///
    /// An explicit start/end pair wins; otherwise a month+year period is
    /// expanded to its first and last day.
    ///
    /// # Errors
    ///
    /// Returns a message when the range is absent, the period is invalid,
    /// or the dates are out of order.
    pub fn resolve_range(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let range = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (start, end),
            (None, None) => match (self.period_year, self.period_month) {
                (Some(year), Some(month)) => {
                    let start = NaiveDate::from_ymd_opt(year, month, 1)
                        .ok_or_else(|| format!("invalid period {year}-{month:02}"))?;
                    let end = if month == 12 {
                        NaiveDate::from_ymd_opt(year + 1, 1, 1)
                    } else {
                        NaiveDate::from_ymd_opt(year, month + 1, 1)
                    }
                    .map(|d| d.pred_opt().unwrap_or(d))
                    .ok_or_else(|| format!("invalid period {year}-{month:02}"))?;
                    (start, end)
                }
                _ => return Err("a date range or period is required".to_string()),
            },
            _ => return Err("both start_date and end_date are required".to_string()),
        };

        if range.0 > range.1 {
            return Err(format!(
                "start date {} is after end date {}",
                range.0, range.1
            ));
        }
        Ok(range)
    }

    /// Returns a copy with the resolved range written into
    /// `start_date`/`end_date`.
    ///
    /// # Errors
    ///
    /// Same as [`ReportParams::resolve_range`].
    pub fn normalized(&self) -> Result<Self, String> {
        let (start, end) = self.resolve_range()?;
        let mut params = self.clone();
        params.start_date = Some(start);
        params.end_date = Some(end);
        Ok(params)
    }
}

/// Typed job-store key: report type plus ticket.
///
/// Keeps tickets namespaced per report type without string concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketKey {
    /// The report type this ticket belongs to.
    pub report_type: ReportType,
    /// The opaque ticket identifier.
    pub ticket: Uuid,
}

impl TicketKey {
    /// Creates a key.
    #[must_use]
    pub fn new(report_type: ReportType, ticket: Uuid) -> Self {
        Self {
            report_type,
            ticket,
        }
    }
}

/// The state a poller observes for one ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    /// Lifecycle status.
    pub status: JobStatus,
    /// Completion percentage, 0-100, monotonically non-decreasing.
    pub progress: u8,
    /// Canonical artifact format.
    pub format: ReportFormat,
    /// Echo of the input parameters (normalized).
    pub params: ReportParams,
    /// Tenant scope the ticket belongs to.
    pub company_id: i64,
    /// Storage key of the finished artifact, once done.
    pub file: Option<String>,
    /// Human-friendly download filename, once done.
    pub filename: Option<String>,
    /// Failure description, once errored.
    pub error: Option<String>,
}

impl JobState {
    /// Seeds the initial state for a freshly accepted job.
    #[must_use]
    pub fn queued(format: ReportFormat, params: ReportParams, company_id: i64) -> Self {
        Self {
            status: JobStatus::Queued,
            progress: 0,
            format,
            params,
            company_id,
            file: None,
            filename: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pdf", ReportFormat::Pdf)]
    #[case("PDF", ReportFormat::Pdf)]
    #[case("xls", ReportFormat::Xls)]
    #[case("xlsx", ReportFormat::Xls)]
    #[case("excel", ReportFormat::Xls)]
    #[case("Excel", ReportFormat::Xls)]
    fn test_format_normalization(#[case] alias: &str, #[case] expected: ReportFormat) {
        assert_eq!(ReportFormat::parse(alias), Some(expected));
    }

    #[test]
    fn test_format_unknown_rejected() {
        assert_eq!(ReportFormat::parse("csv"), None);
        assert_eq!(ReportFormat::parse(""), None);
    }

    #[test]
    fn test_format_extension_and_mime_agree() {
        assert_eq!(ReportFormat::Pdf.extension(), "pdf");
        assert_eq!(ReportFormat::Pdf.mime(), "application/pdf");
        assert_eq!(ReportFormat::Xls.extension(), "xls");
        assert_eq!(ReportFormat::Xls.mime(), "application/vnd.ms-excel");
    }

    #[test]
    fn test_report_type_slug_round_trip() {
        for rt in ReportType::ALL {
            assert_eq!(ReportType::parse_slug(rt.slug()), Some(rt));
        }
        assert_eq!(ReportType::parse_slug("balance-sheet"), None);
    }

    #[test]
    fn test_balanced_aggregate_exemptions() {
        assert!(!ReportType::GeneralLedger.requires_balanced_aggregate());
        assert!(!ReportType::CheckRegister.requires_balanced_aggregate());
        assert!(ReportType::TrialBalance.requires_balanced_aggregate());
        assert!(ReportType::GeneralJournalBook.requires_balanced_aggregate());
        assert!(ReportType::CashReceiptBook.requires_balanced_aggregate());
        assert!(ReportType::PayableJournal.requires_balanced_aggregate());
    }

    #[test]
    fn test_status_terminality() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn test_resolve_range_explicit() {
        let params = ReportParams {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31),
            ..ReportParams::default()
        };
        let (start, end) = params.resolve_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
    }

    #[test]
    fn test_resolve_range_rejects_reversed_dates() {
        let params = ReportParams {
            start_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..ReportParams::default()
        };
        assert!(params.resolve_range().is_err());
    }

    #[test]
    fn test_resolve_range_from_period() {
        let params = ReportParams {
            period_month: Some(2),
            period_year: Some(2024),
            ..ReportParams::default()
        };
        let (start, end) = params.resolve_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_resolve_range_december_period() {
        let params = ReportParams {
            period_month: Some(12),
            period_year: Some(2025),
            ..ReportParams::default()
        };
        let (start, end) = params.resolve_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_resolve_range_missing() {
        assert!(ReportParams::default().resolve_range().is_err());

        let half = ReportParams {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..ReportParams::default()
        };
        assert!(half.resolve_range().is_err());
    }

    #[test]
    fn test_normalized_fills_dates() {
        let params = ReportParams {
            period_month: Some(6),
            period_year: Some(2025),
            ..ReportParams::default()
        };
        let normalized = params.normalized().unwrap();
        assert_eq!(
            normalized.start_date,
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(normalized.end_date, NaiveDate::from_ymd_opt(2025, 6, 30));
    }
}
