//! Report query repository.
//!
//! Read-only, company-scoped queries feeding the report builder. Display
//! joins (account descriptions, counterparty names) are themselves scoped
//! to the company so a shared reference table can never leak another
//! tenant's data into a report.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use tracing::warn;

use canebooks_core::journal::{JournalKind, RecordState};
use canebooks_core::pipeline::{ReportDataSource, SourceError};
use canebooks_core::reports::{AccountCategory, AccountSummary, CheckRow, LedgerRow};

use crate::entities::{accounts, customers, transaction_details, transaction_headers, vendors};

/// Error types for report queries.
#[derive(Debug, thiserror::Error)]
pub enum ReportQueryError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Report repository for company-scoped ledger reads.
#[derive(Debug)]
pub struct ReportQueryRepository {
    db: DatabaseConnection,
}

impl ReportQueryRepository {
    /// Creates a new report query repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active headers of one module within the date range.
    async fn active_headers(
        &self,
        company_id: i64,
        kind: JournalKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<transaction_headers::Model>, ReportQueryError> {
        Ok(transaction_headers::Entity::find()
            .filter(transaction_headers::Column::CompanyId.eq(company_id))
            .filter(transaction_headers::Column::JournalKind.eq(kind.as_str()))
            .filter(transaction_headers::Column::DocDate.gte(start))
            .filter(transaction_headers::Column::DocDate.lte(end))
            .filter(
                transaction_headers::Column::CancelFlag
                    .eq(kind.encode_state(RecordState::Active)),
            )
            .order_by_asc(transaction_headers::Column::DocDate)
            .order_by_asc(transaction_headers::Column::DocNo)
            .all(&self.db)
            .await?)
    }

    /// Account code -> (description, category) for the company.
    async fn account_index(
        &self,
        company_id: i64,
    ) -> Result<HashMap<String, (String, AccountCategory)>, ReportQueryError> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id))
            .all(&self.db)
            .await?;

        let mut index = HashMap::with_capacity(rows.len());
        for account in rows {
            let Some(category) = AccountCategory::parse(&account.category) else {
                warn!(code = %account.code, category = %account.category, "unknown account category");
                continue;
            };
            index.insert(account.code, (account.description, category));
        }
        Ok(index)
    }

    /// Counterparty id -> display name for the module's counterparty table.
    async fn counterparty_index(
        &self,
        company_id: i64,
        kind: JournalKind,
    ) -> Result<HashMap<i64, String>, ReportQueryError> {
        let index = match kind {
            JournalKind::CashReceipt | JournalKind::CashSales => customers::Entity::find()
                .filter(customers::Column::CompanyId.eq(company_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect(),
            JournalKind::CashDisbursement | JournalKind::CashPurchase => vendors::Entity::find()
                .filter(vendors::Column::CompanyId.eq(company_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|v| (v.id, v.name))
                .collect(),
            JournalKind::GeneralAccounting => HashMap::new(),
        };
        Ok(index)
    }

    /// Detail rows for the builder, with display joins applied.
    async fn query_ledger_rows(
        &self,
        company_id: i64,
        kinds: &[JournalKind],
        start: NaiveDate,
        end: NaiveDate,
        account_from: Option<&str>,
        account_to: Option<&str>,
    ) -> Result<Vec<LedgerRow>, ReportQueryError> {
        let account_index = self.account_index(company_id).await?;
        let mut rows = Vec::new();

        for &kind in kinds {
            let headers = self.active_headers(company_id, kind, start, end).await?;
            if headers.is_empty() {
                continue;
            }
            let counterparties = self.counterparty_index(company_id, kind).await?;
            let header_index: HashMap<_, _> = headers.iter().map(|h| (h.id, h)).collect();

            let mut query = transaction_details::Entity::find().filter(
                transaction_details::Column::HeaderId
                    .is_in(headers.iter().map(|h| h.id).collect::<Vec<_>>()),
            );
            if let Some(from) = account_from {
                query = query.filter(transaction_details::Column::AcctCode.gte(from));
            }
            if let Some(to) = account_to {
                query = query.filter(transaction_details::Column::AcctCode.lte(to));
            }
            let details = query.all(&self.db).await?;

            for detail in details {
                let Some(header) = header_index.get(&detail.header_id) else {
                    continue;
                };
                let acct_description = account_index
                    .get(&detail.acct_code)
                    .map(|(description, _)| description.clone())
                    .unwrap_or_default();
                let counterparty = header
                    .counterparty_id
                    .and_then(|id| counterparties.get(&id).cloned());

                rows.push(LedgerRow {
                    date: header.doc_date,
                    journal: kind,
                    doc_no: header.doc_no,
                    acct_code: detail.acct_code,
                    acct_description,
                    counterparty,
                    explanation: header.explanation.clone(),
                    debit: detail.debit,
                    credit: detail.credit,
                });
            }
        }

        Ok(rows)
    }

    /// Per-account debit/credit totals over all modules in the range.
    async fn query_account_summaries(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AccountSummary>, ReportQueryError> {
        let account_index = self.account_index(company_id).await?;
        let mut totals: HashMap<String, (Decimal, Decimal)> = HashMap::new();

        for kind in JournalKind::ALL {
            let headers = self.active_headers(company_id, kind, start, end).await?;
            if headers.is_empty() {
                continue;
            }

            let details = transaction_details::Entity::find()
                .filter(
                    transaction_details::Column::HeaderId
                        .is_in(headers.iter().map(|h| h.id).collect::<Vec<_>>()),
                )
                .all(&self.db)
                .await?;

            for detail in details {
                let entry = totals.entry(detail.acct_code).or_default();
                entry.0 += detail.debit;
                entry.1 += detail.credit;
            }
        }

        let mut summaries = Vec::with_capacity(totals.len());
        for (code, (debit, credit)) in totals {
            let Some((description, category)) = account_index.get(&code) else {
                warn!(code = %code, "posted account code missing from accounts table");
                continue;
            };
            summaries.push(AccountSummary {
                acct_code: code,
                description: description.clone(),
                category: *category,
                debit,
                credit,
            });
        }
        summaries.sort_by(|a, b| a.acct_code.cmp(&b.acct_code));
        Ok(summaries)
    }

    /// Issued checks (cash disbursements carrying a check number).
    async fn query_check_rows(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CheckRow>, ReportQueryError> {
        let headers = self
            .active_headers(company_id, JournalKind::CashDisbursement, start, end)
            .await?;
        let vendors = self
            .counterparty_index(company_id, JournalKind::CashDisbursement)
            .await?;

        Ok(headers
            .into_iter()
            .filter_map(|header| {
                let check_no = header.check_no?;
                Some(CheckRow {
                    date: header.doc_date,
                    check_no,
                    doc_no: header.doc_no,
                    payee: header
                        .counterparty_id
                        .and_then(|id| vendors.get(&id).cloned()),
                    amount: header.amount,
                })
            })
            .collect())
    }
}

#[async_trait]
impl ReportDataSource for ReportQueryRepository {
    async fn ledger_rows(
        &self,
        company_id: i64,
        kinds: &[JournalKind],
        start: NaiveDate,
        end: NaiveDate,
        account_from: Option<&str>,
        account_to: Option<&str>,
    ) -> Result<Vec<LedgerRow>, SourceError> {
        self.query_ledger_rows(company_id, kinds, start, end, account_from, account_to)
            .await
            .map_err(|e| SourceError::Query(e.to_string()))
    }

    async fn account_summaries(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AccountSummary>, SourceError> {
        self.query_account_summaries(company_id, start, end)
            .await
            .map_err(|e| SourceError::Query(e.to_string()))
    }

    async fn check_rows(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CheckRow>, SourceError> {
        self.query_check_rows(company_id, start, end)
            .await
            .map_err(|e| SourceError::Query(e.to_string()))
    }
}
