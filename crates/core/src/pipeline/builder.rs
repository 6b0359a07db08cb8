//! Report builder: drives one ticket to a terminal state.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::FutureExt;
use thiserror::Error;
use tracing::{error, info};

use super::source::{ReportDataSource, SourceError};
use crate::jobs::{JobStore, ReportFormat, ReportParams, ReportType, TicketKey};
use crate::render::{self, RenderError};
use crate::reports::{
    self, ReportError, ReportTable, build_check_register, build_general_ledger,
    build_journal_book, build_trial_balance,
};
use crate::storage::{ArtifactStore, StorageError};

/// Unrecoverable build failure; recorded on the ticket's terminal state.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The ledger query failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The aggregated data violates a report invariant.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The artifact could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The seeded parameters are unusable (should have been caught at
    /// scheduling time).
    #[error("invalid report parameters: {0}")]
    Params(String),
}

/// Everything one build execution needs; owns its clones of the shared
/// stores so the spawned task has no borrowed state.
pub(crate) struct BuildContext {
    pub jobs: Arc<JobStore>,
    pub artifacts: Arc<ArtifactStore>,
    pub source: Arc<dyn ReportDataSource>,
    pub key: TicketKey,
    pub company_id: i64,
    pub format: ReportFormat,
    pub params: ReportParams,
}

/// Runs one build to a terminal state.
///
/// Nothing downstream waits synchronously, so every failure path must land
/// in the job store: errors are captured into the `error` terminal state
/// and panics are absorbed by the unwind guard. A job observable as
/// `running` forever is not a reachable state.
pub(crate) async fn run_build(ctx: BuildContext) {
    let key = ctx.key;
    let jobs = Arc::clone(&ctx.jobs);

    match AssertUnwindSafe(build(ctx)).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(report = key.report_type.slug(), ticket = %key.ticket, error = %e, "report build failed");
            jobs.fail(&key, e.to_string());
        }
        Err(_) => {
            error!(report = key.report_type.slug(), ticket = %key.ticket, "report build panicked");
            jobs.fail(&key, "report build aborted unexpectedly");
        }
    }
}

async fn build(ctx: BuildContext) -> Result<(), BuildError> {
    let key = ctx.key;
    ctx.jobs.mark_running(&key);

    let (start, end) = ctx
        .params
        .resolve_range()
        .map_err(BuildError::Params)?;

    let table = aggregate(&ctx, start, end).await?;
    ctx.jobs.set_progress(&key, 60);

    let bytes = render::render(&table, ctx.format)?;
    ctx.jobs.set_progress(&key, 85);

    let filename = format!(
        "{}_{start}_{end}.{}",
        key.report_type.slug(),
        ctx.format.extension()
    );
    let storage_key = ArtifactStore::artifact_key(key.report_type, key.ticket, &filename);
    ctx.artifacts.write(&storage_key, bytes).await?;

    ctx.jobs.complete(&key, storage_key, filename);
    info!(report = key.report_type.slug(), ticket = %key.ticket, "report build finished");
    Ok(())
}

/// Queries and folds the data for the requested report type.
///
/// Full-transaction reports refuse to render when the aggregate debit and
/// credit totals disagree; the refusal carries a distinct message rather
/// than a generic failure.
async fn aggregate(
    ctx: &BuildContext,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ReportTable, BuildError> {
    let report_type = ctx.key.report_type;
    let subtitle = format!("{start} to {end}");
    ctx.jobs.set_progress(&ctx.key, 20);

    let table = match report_type {
        ReportType::TrialBalance => {
            let summaries = ctx
                .source
                .account_summaries(ctx.company_id, start, end)
                .await?;
            ctx.jobs.set_progress(&ctx.key, 40);

            let report = build_trial_balance(summaries);
            reports::verify_balanced_aggregate(report.total_debit, report.total_credit)?;
            report.to_table(subtitle)
        }
        ReportType::CheckRegister => {
            let rows = ctx.source.check_rows(ctx.company_id, start, end).await?;
            ctx.jobs.set_progress(&ctx.key, 40);
            build_check_register(rows).to_table(subtitle)
        }
        ReportType::GeneralLedger => {
            let rows = ctx
                .source
                .ledger_rows(
                    ctx.company_id,
                    report_type.source_kinds(),
                    start,
                    end,
                    ctx.params.account_from.as_deref(),
                    ctx.params.account_to.as_deref(),
                )
                .await?;
            ctx.jobs.set_progress(&ctx.key, 40);
            build_general_ledger(rows).to_table(subtitle)
        }
        ReportType::CashReceiptBook
        | ReportType::CashDisbursementBook
        | ReportType::GeneralJournalBook
        | ReportType::PayableJournal
        | ReportType::ReceivableJournal => {
            let rows = ctx
                .source
                .ledger_rows(
                    ctx.company_id,
                    report_type.source_kinds(),
                    start,
                    end,
                    None,
                    None,
                )
                .await?;
            ctx.jobs.set_progress(&ctx.key, 40);

            let report = build_journal_book(rows);
            if report_type.requires_balanced_aggregate() {
                reports::verify_balanced_aggregate(report.total_debit, report.total_credit)?;
            }
            report.to_table(report_type.title().to_string(), subtitle)
        }
    };

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobAccessError, JobStatus};
    use crate::journal::JournalKind;
    use crate::pipeline::{Dispatch, ReportRequest, ReportScheduler, ScheduleError};
    use crate::reports::{AccountCategory, AccountSummary, CheckRow, LedgerRow};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use uuid::Uuid;

    /// In-memory data source with switchable failure modes.
    struct FakeSource {
        rows: Vec<LedgerRow>,
        summaries: Vec<AccountSummary>,
        checks: Vec<CheckRow>,
        fail_queries: bool,
        panic_on_query: bool,
    }

    impl FakeSource {
        fn balanced() -> Self {
            let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
            Self {
                rows: vec![
                    LedgerRow {
                        date,
                        journal: JournalKind::GeneralAccounting,
                        doc_no: 1,
                        acct_code: "1010".to_string(),
                        acct_description: "Cash in Bank".to_string(),
                        counterparty: None,
                        explanation: "Opening entry".to_string(),
                        debit: dec!(500),
                        credit: Decimal::ZERO,
                    },
                    LedgerRow {
                        date,
                        journal: JournalKind::GeneralAccounting,
                        doc_no: 1,
                        acct_code: "3000".to_string(),
                        acct_description: "Owner Equity".to_string(),
                        counterparty: None,
                        explanation: "Opening entry".to_string(),
                        debit: Decimal::ZERO,
                        credit: dec!(500),
                    },
                ],
                summaries: vec![
                    AccountSummary {
                        acct_code: "1010".to_string(),
                        description: "Cash in Bank".to_string(),
                        category: AccountCategory::Asset,
                        debit: dec!(500),
                        credit: Decimal::ZERO,
                    },
                    AccountSummary {
                        acct_code: "3000".to_string(),
                        description: "Owner Equity".to_string(),
                        category: AccountCategory::Equity,
                        debit: Decimal::ZERO,
                        credit: dec!(500),
                    },
                ],
                checks: vec![CheckRow {
                    date,
                    check_no: "1001".to_string(),
                    doc_no: 1,
                    payee: Some("Acme Supply".to_string()),
                    amount: dec!(250),
                }],
                fail_queries: false,
                panic_on_query: false,
            }
        }

        fn unbalanced() -> Self {
            let mut source = Self::balanced();
            source.summaries[1].credit = dec!(350);
            source.rows[1].credit = dec!(350);
            source
        }
    }

    #[async_trait]
    impl ReportDataSource for FakeSource {
        async fn ledger_rows(
            &self,
            _company_id: i64,
            kinds: &[JournalKind],
            _start: NaiveDate,
            _end: NaiveDate,
            _account_from: Option<&str>,
            _account_to: Option<&str>,
        ) -> Result<Vec<LedgerRow>, SourceError> {
            assert!(!self.panic_on_query, "query exploded");
            if self.fail_queries {
                return Err(SourceError::Query("connection reset".to_string()));
            }
            Ok(self
                .rows
                .iter()
                .filter(|r| kinds.contains(&r.journal))
                .cloned()
                .collect())
        }

        async fn account_summaries(
            &self,
            _company_id: i64,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<AccountSummary>, SourceError> {
            if self.fail_queries {
                return Err(SourceError::Query("connection reset".to_string()));
            }
            Ok(self.summaries.clone())
        }

        async fn check_rows(
            &self,
            _company_id: i64,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<CheckRow>, SourceError> {
            if self.fail_queries {
                return Err(SourceError::Query("connection reset".to_string()));
            }
            Ok(self.checks.clone())
        }
    }

    fn scheduler(source: FakeSource) -> (ReportScheduler, Arc<JobStore>, std::path::PathBuf) {
        let jobs = Arc::new(JobStore::new());
        let root = std::env::temp_dir().join(format!("canebooks-build-{}", Uuid::new_v4()));
        let artifacts = Arc::new(ArtifactStore::local(&root).expect("local store"));
        let scheduler = ReportScheduler::new(Arc::clone(&jobs), artifacts, Arc::new(source));
        (scheduler, jobs, root)
    }

    fn request(format: &str, company_id: i64) -> ReportRequest {
        ReportRequest {
            format: format.to_string(),
            company_id,
            params: ReportParams {
                start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2025, 1, 31),
                ..ReportParams::default()
            },
        }
    }

    #[tokio::test]
    async fn test_inline_trial_balance_reaches_done() {
        let (scheduler, jobs, root) = scheduler(FakeSource::balanced());
        let ticket = scheduler
            .start(ReportType::TrialBalance, request("pdf", 7), Dispatch::Inline)
            .await
            .unwrap();

        let key = TicketKey::new(ReportType::TrialBalance, ticket);
        let state = jobs.get(&key).unwrap();
        assert_eq!(state.status, JobStatus::Done);
        assert_eq!(state.progress, 100);
        assert!(state.file.is_some());
        assert!(state.filename.as_deref().unwrap().ends_with(".pdf"));
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_build_reaches_terminal_within_bounded_polls() {
        let (scheduler, jobs, root) = scheduler(FakeSource::balanced());
        let ticket = scheduler
            .start(
                ReportType::GeneralJournalBook,
                request("pdf", 7),
                Dispatch::Spawned,
            )
            .await
            .unwrap();

        let key = TicketKey::new(ReportType::GeneralJournalBook, ticket);
        let mut terminal = None;
        for _ in 0..100 {
            let state = jobs.get(&key).unwrap();
            if state.status.is_terminal() {
                terminal = Some(state);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let state = terminal.expect("job stuck without a terminal state");
        assert_eq!(state.status, JobStatus::Done);
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_query_fault_lands_in_error_state() {
        let mut source = FakeSource::balanced();
        source.fail_queries = true;
        let (scheduler, jobs, root) = scheduler(source);

        let ticket = scheduler
            .start(ReportType::TrialBalance, request("pdf", 7), Dispatch::Inline)
            .await
            .unwrap();

        let key = TicketKey::new(ReportType::TrialBalance, ticket);
        let state = jobs.get(&key).unwrap();
        assert_eq!(state.status, JobStatus::Error);
        assert!(state.file.is_none());
        assert!(state.error.as_deref().unwrap().contains("connection reset"));
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_panic_lands_in_error_state() {
        let mut source = FakeSource::balanced();
        source.panic_on_query = true;
        let (scheduler, jobs, root) = scheduler(source);

        let ticket = scheduler
            .start(
                ReportType::CashReceiptBook,
                request("pdf", 7),
                Dispatch::Inline,
            )
            .await
            .unwrap();

        let key = TicketKey::new(ReportType::CashReceiptBook, ticket);
        let state = jobs.get(&key).unwrap();
        assert_eq!(state.status, JobStatus::Error);
        assert!(!state.error.as_deref().unwrap_or("").is_empty());
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_unbalanced_data_refused_with_distinct_message() {
        let (scheduler, jobs, root) = scheduler(FakeSource::unbalanced());

        for report_type in [ReportType::TrialBalance, ReportType::GeneralJournalBook] {
            let ticket = scheduler
                .start(report_type, request("pdf", 7), Dispatch::Inline)
                .await
                .unwrap();

            let key = TicketKey::new(report_type, ticket);
            let state = jobs.get(&key).unwrap();
            assert_eq!(state.status, JobStatus::Error);
            assert!(state.file.is_none(), "no artifact may be referenced");
            assert!(state.error.as_deref().unwrap().contains("unbalanced"));
        }
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_general_ledger_exempt_from_balance_refusal() {
        // A filtered projection cannot satisfy debit == credit; the GL
        // still builds.
        let (scheduler, jobs, root) = scheduler(FakeSource::unbalanced());
        let mut req = request("pdf", 7);
        req.params.account_from = Some("1000".to_string());
        req.params.account_to = Some("1999".to_string());

        let ticket = scheduler
            .start(ReportType::GeneralLedger, req, Dispatch::Inline)
            .await
            .unwrap();

        let key = TicketKey::new(ReportType::GeneralLedger, ticket);
        assert_eq!(jobs.get(&key).unwrap().status, JobStatus::Done);
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_format_alias_normalized_into_state_and_filename() {
        for alias in ["excel", "xlsx", "XLS"] {
            let (scheduler, jobs, root) = scheduler(FakeSource::balanced());
            let ticket = scheduler
                .start(ReportType::TrialBalance, request(alias, 7), Dispatch::Inline)
                .await
                .unwrap();

            let key = TicketKey::new(ReportType::TrialBalance, ticket);
            let state = jobs.get(&key).unwrap();
            assert_eq!(state.format, ReportFormat::Xls);
            assert_eq!(state.format.mime(), "application/vnd.ms-excel");
            assert!(state.filename.as_deref().unwrap().ends_with(".xls"));
            let _ = std::fs::remove_dir_all(root);
        }
    }

    #[tokio::test]
    async fn test_validation_rejected_before_ticket_exists() {
        let (scheduler, jobs, root) = scheduler(FakeSource::balanced());

        let bad_format = scheduler
            .start(ReportType::TrialBalance, request("docx", 7), Dispatch::Inline)
            .await;
        assert!(matches!(bad_format, Err(ScheduleError::Validation(_))));

        let mut reversed = request("pdf", 7);
        reversed.params.start_date = NaiveDate::from_ymd_opt(2025, 2, 1);
        reversed.params.end_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        let bad_range = scheduler
            .start(ReportType::TrialBalance, reversed, Dispatch::Inline)
            .await;
        assert!(matches!(bad_range, Err(ScheduleError::Validation(_))));

        assert_eq!(jobs.entry_count(), 0);
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_each_request_mints_a_fresh_ticket() {
        let (scheduler, _jobs, root) = scheduler(FakeSource::balanced());
        let a = scheduler
            .start(ReportType::TrialBalance, request("pdf", 7), Dispatch::Inline)
            .await
            .unwrap();
        let b = scheduler
            .start(ReportType::TrialBalance, request("pdf", 7), Dispatch::Inline)
            .await
            .unwrap();
        assert_ne!(a, b);
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_end_to_end_pdf_lifecycle_with_tenant_isolation() {
        let jobs = Arc::new(JobStore::new());
        let root = std::env::temp_dir().join(format!("canebooks-e2e-{}", Uuid::new_v4()));
        let artifacts = Arc::new(ArtifactStore::local(&root).expect("local store"));
        let scheduler = ReportScheduler::new(
            Arc::clone(&jobs),
            Arc::clone(&artifacts),
            Arc::new(FakeSource::balanced()),
        );

        let ticket = scheduler
            .start(ReportType::GeneralLedger, request("pdf", 7), Dispatch::Inline)
            .await
            .unwrap();
        let key = TicketKey::new(ReportType::GeneralLedger, ticket);

        // Owner polls to done and retrieves a PDF artifact.
        let state = jobs.get_scoped(&key, 7).unwrap();
        assert_eq!(state.status, JobStatus::Done);
        let bytes = artifacts.read(state.file.as_deref().unwrap()).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(state.format.mime(), "application/pdf");

        // A different company is refused on every read.
        assert_eq!(
            jobs.get_scoped(&key, 99).unwrap_err(),
            JobAccessError::Forbidden
        );

        let _ = std::fs::remove_dir_all(root);
    }
}
