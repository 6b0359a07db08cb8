//! Journal repository: the ledger entry store.
//!
//! Every detail mutation runs inside one database transaction that
//! validates the line, re-syncs the bank offset row (cash modules), and
//! recomputes the header's cached totals, so a crash can never leave stale
//! aggregates behind.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use canebooks_core::balance::{BalanceEngine, BalanceError, DetailLine};
use canebooks_core::journal::{JournalKind, RecordState};
use canebooks_shared::AppError;

use crate::entities::transaction_details::BANK_TAG;
use crate::entities::{accounts, transaction_details, transaction_headers};

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Transaction not found in the caller's scope.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Detail row not found on the transaction.
    #[error("Detail row not found: {0}")]
    DetailNotFound(Uuid),

    /// Account code unknown for this company.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account exists but is inactive.
    #[error("Account is inactive: {0}")]
    AccountInactive(String),

    /// No active GL account is linked to the selected bank.
    #[error("No active account is linked to bank {0}")]
    BankAccountNotFound(i64),

    /// The bank offset row is system-maintained.
    #[error("The bank row is system-maintained and cannot be modified directly")]
    BankRowProtected,

    /// The record is cancelled or deleted.
    #[error("Record is not active")]
    RecordNotActive,

    /// Balance engine rejection.
    #[error(transparent)]
    Balance(#[from] BalanceError),

    /// Persisted cancellation flag is not decodable for the module.
    #[error("Unknown cancellation flag '{0}' for this module")]
    InvalidStateFlag(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match &err {
            JournalError::NotFound(_) | JournalError::DetailNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            JournalError::AccountNotFound(_)
            | JournalError::AccountInactive(_)
            | JournalError::BankAccountNotFound(_)
            | JournalError::BankRowProtected
            | JournalError::RecordNotActive
            | JournalError::Balance(_) => Self::BusinessRule(err.to_string()),
            JournalError::InvalidStateFlag(_) => Self::Internal(err.to_string()),
            JournalError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Input for creating a transaction header.
#[derive(Debug, Clone)]
pub struct CreateHeaderInput {
    /// Tenant scope.
    pub company_id: i64,
    /// Journal module.
    pub kind: JournalKind,
    /// Transaction date.
    pub doc_date: NaiveDate,
    /// Customer/vendor reference, per module.
    pub counterparty_id: Option<i64>,
    /// Selected bank, cash modules only.
    pub bank_id: Option<i64>,
    /// Check number, cash disbursements only.
    pub check_no: Option<String>,
    /// Free-text explanation.
    pub explanation: String,
}

/// Input for a new detail line.
#[derive(Debug, Clone)]
pub struct NewDetail {
    /// Account code to post to.
    pub acct_code: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Partial update of a detail line.
#[derive(Debug, Clone)]
pub struct DetailPatch {
    /// Replacement account code, when changing it.
    pub acct_code: Option<String>,
    /// Replacement debit amount.
    pub debit: Decimal,
    /// Replacement credit amount.
    pub credit: Decimal,
}

/// A header with its detail rows.
#[derive(Debug, Clone)]
pub struct HeaderWithDetails {
    /// Transaction header.
    pub header: transaction_headers::Model,
    /// Detail rows, oldest first.
    pub details: Vec<transaction_details::Model>,
}

/// Journal repository for header/detail operations.
#[derive(Debug)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a header with zero totals and the next document number for
    /// its company + module.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_header(
        &self,
        input: CreateHeaderInput,
    ) -> Result<transaction_headers::Model, JournalError> {
        let txn = self.db.begin().await?;

        let last = transaction_headers::Entity::find()
            .filter(transaction_headers::Column::CompanyId.eq(input.company_id))
            .filter(transaction_headers::Column::JournalKind.eq(input.kind.as_str()))
            .order_by_desc(transaction_headers::Column::DocNo)
            .one(&txn)
            .await?;
        let doc_no = last.map_or(1, |h| h.doc_no + 1);

        let now = Utc::now().into();
        let header = transaction_headers::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            journal_kind: Set(input.kind.as_str().to_string()),
            doc_no: Set(doc_no),
            doc_date: Set(input.doc_date),
            counterparty_id: Set(input.counterparty_id),
            bank_id: Set(input.bank_id),
            check_no: Set(input.check_no),
            explanation: Set(input.explanation),
            cancel_flag: Set(input.kind.encode_state(RecordState::Active).to_string()),
            sum_debit: Set(Decimal::ZERO),
            sum_credit: Set(Decimal::ZERO),
            amount: Set(Decimal::ZERO),
            is_balanced: Set(true),
            posted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(header)
    }

    /// Loads a header with its details, scoped to the company and module.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the record is outside the caller's scope.
    pub async fn find(
        &self,
        kind: JournalKind,
        id: Uuid,
        company_id: i64,
    ) -> Result<HeaderWithDetails, JournalError> {
        let header = load_header(&self.db, kind, id, company_id).await?;
        let details = load_details(&self.db, id).await?;
        Ok(HeaderWithDetails { header, details })
    }

    /// Adds a detail line, then re-syncs the bank row and cached totals
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or any write fails; nothing is
    /// persisted in that case.
    pub async fn add_detail(
        &self,
        kind: JournalKind,
        header_id: Uuid,
        company_id: i64,
        detail: NewDetail,
    ) -> Result<HeaderWithDetails, JournalError> {
        let txn = self.db.begin().await?;

        let header = load_header(&txn, kind, header_id, company_id).await?;
        ensure_active(kind, &header)?;

        let account = require_active_account(&txn, company_id, &detail.acct_code).await?;
        let existing = load_lines(&txn, header_id).await?;
        let line = DetailLine::new(account.code.clone(), detail.debit, detail.credit);
        BalanceEngine::validate_line(kind, &line, &existing)?;

        let now = Utc::now().into();
        transaction_details::ActiveModel {
            id: Set(Uuid::new_v4()),
            header_id: Set(header_id),
            acct_code: Set(account.code),
            debit: Set(detail.debit),
            credit: Set(detail.credit),
            workstation_tag: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        sync_bank_row(&txn, kind, &header).await?;
        store_totals(&txn, kind, &header).await?;

        txn.commit().await?;
        self.find(kind, header_id, company_id).await
    }

    /// Rewrites a detail line, then re-syncs the bank row and cached
    /// totals atomically. The bank row itself cannot be edited.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or any write fails.
    pub async fn update_detail(
        &self,
        kind: JournalKind,
        header_id: Uuid,
        detail_id: Uuid,
        company_id: i64,
        patch: DetailPatch,
    ) -> Result<HeaderWithDetails, JournalError> {
        let txn = self.db.begin().await?;

        let header = load_header(&txn, kind, header_id, company_id).await?;
        ensure_active(kind, &header)?;

        let detail = load_detail(&txn, header_id, detail_id).await?;
        if detail.is_bank_row() {
            return Err(JournalError::BankRowProtected);
        }

        let acct_code = match patch.acct_code {
            Some(code) => require_active_account(&txn, company_id, &code).await?.code,
            None => detail.acct_code.clone(),
        };

        let others: Vec<DetailLine> = load_details(&txn, header_id)
            .await?
            .into_iter()
            .filter(|model| model.id != detail_id)
            .map(|d| DetailLine {
                bank_row: d.is_bank_row(),
                acct_code: d.acct_code,
                debit: d.debit,
                credit: d.credit,
            })
            .collect();
        let line = DetailLine::new(acct_code.clone(), patch.debit, patch.credit);
        BalanceEngine::validate_line(kind, &line, &others)?;

        let mut active: transaction_details::ActiveModel = detail.into();
        active.acct_code = Set(acct_code);
        active.debit = Set(patch.debit);
        active.credit = Set(patch.credit);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        sync_bank_row(&txn, kind, &header).await?;
        store_totals(&txn, kind, &header).await?;

        txn.commit().await?;
        self.find(kind, header_id, company_id).await
    }

    /// Removes a detail line, then re-syncs the bank row and cached totals
    /// atomically. The bank row itself cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is protected or any write fails.
    pub async fn remove_detail(
        &self,
        kind: JournalKind,
        header_id: Uuid,
        detail_id: Uuid,
        company_id: i64,
    ) -> Result<HeaderWithDetails, JournalError> {
        let txn = self.db.begin().await?;

        let header = load_header(&txn, kind, header_id, company_id).await?;
        ensure_active(kind, &header)?;

        let detail = load_detail(&txn, header_id, detail_id).await?;
        if detail.is_bank_row() {
            return Err(JournalError::BankRowProtected);
        }

        transaction_details::Entity::delete_by_id(detail.id)
            .exec(&txn)
            .await?;

        sync_bank_row(&txn, kind, &header).await?;
        store_totals(&txn, kind, &header).await?;

        txn.commit().await?;
        self.find(kind, header_id, company_id).await
    }

    /// Soft-cancels a record via its module's legacy flag. Details are
    /// retained.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is outside the caller's scope.
    pub async fn cancel(
        &self,
        kind: JournalKind,
        id: Uuid,
        company_id: i64,
    ) -> Result<transaction_headers::Model, JournalError> {
        let header = load_header(&self.db, kind, id, company_id).await?;

        let mut active: transaction_headers::ActiveModel = header.into();
        active.cancel_flag = Set(kind.encode_state(RecordState::Cancelled).to_string());
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Flips the posted flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is outside the caller's scope.
    pub async fn set_posted(
        &self,
        kind: JournalKind,
        id: Uuid,
        company_id: i64,
        posted: bool,
    ) -> Result<transaction_headers::Model, JournalError> {
        let header = load_header(&self.db, kind, id, company_id).await?;

        let mut active: transaction_headers::ActiveModel = header.into();
        active.posted = Set(posted);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }
}

/// Loads a header and verifies company + module scope.
async fn load_header<C: ConnectionTrait>(
    conn: &C,
    kind: JournalKind,
    id: Uuid,
    company_id: i64,
) -> Result<transaction_headers::Model, JournalError> {
    let header = transaction_headers::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(JournalError::NotFound(id))?;

    if header.company_id != company_id || header.journal_kind != kind.as_str() {
        return Err(JournalError::NotFound(id));
    }
    Ok(header)
}

/// Rejects mutation of cancelled/deleted records.
fn ensure_active(
    kind: JournalKind,
    header: &transaction_headers::Model,
) -> Result<(), JournalError> {
    let state = kind
        .decode_state(&header.cancel_flag)
        .ok_or_else(|| JournalError::InvalidStateFlag(header.cancel_flag.clone()))?;
    if state != RecordState::Active {
        return Err(JournalError::RecordNotActive);
    }
    Ok(())
}

async fn load_details<C: ConnectionTrait>(
    conn: &C,
    header_id: Uuid,
) -> Result<Vec<transaction_details::Model>, JournalError> {
    Ok(transaction_details::Entity::find()
        .filter(transaction_details::Column::HeaderId.eq(header_id))
        .order_by_asc(transaction_details::Column::CreatedAt)
        .all(conn)
        .await?)
}

async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    header_id: Uuid,
    detail_id: Uuid,
) -> Result<transaction_details::Model, JournalError> {
    let detail = transaction_details::Entity::find_by_id(detail_id)
        .one(conn)
        .await?
        .ok_or(JournalError::DetailNotFound(detail_id))?;
    if detail.header_id != header_id {
        return Err(JournalError::DetailNotFound(detail_id));
    }
    Ok(detail)
}

async fn load_lines<C: ConnectionTrait>(
    conn: &C,
    header_id: Uuid,
) -> Result<Vec<DetailLine>, JournalError> {
    Ok(load_details(conn, header_id)
        .await?
        .into_iter()
        .map(|d| DetailLine {
            bank_row: d.is_bank_row(),
            acct_code: d.acct_code,
            debit: d.debit,
            credit: d.credit,
        })
        .collect())
}

async fn require_active_account<C: ConnectionTrait>(
    conn: &C,
    company_id: i64,
    code: &str,
) -> Result<accounts::Model, JournalError> {
    let account = accounts::Entity::find()
        .filter(accounts::Column::CompanyId.eq(company_id))
        .filter(accounts::Column::Code.eq(code))
        .one(conn)
        .await?
        .ok_or_else(|| JournalError::AccountNotFound(code.to_string()))?;

    if !account.is_active {
        return Err(JournalError::AccountInactive(code.to_string()));
    }
    Ok(account)
}

/// Re-syncs the bank offset row for cash modules.
///
/// Resolves the GL account linked to the header's selected bank, computes
/// the force-balancing amount, and creates or rewrites the tagged row.
/// Runs before [`store_totals`] so the cached sums include the corrected
/// bank amount.
async fn sync_bank_row<C: ConnectionTrait>(
    conn: &C,
    kind: JournalKind,
    header: &transaction_headers::Model,
) -> Result<(), JournalError> {
    if !kind.has_bank_row() {
        return Ok(());
    }
    let Some(bank_id) = header.bank_id else {
        return Ok(());
    };

    let bank_account = accounts::Entity::find()
        .filter(accounts::Column::CompanyId.eq(header.company_id))
        .filter(accounts::Column::BankId.eq(bank_id))
        .filter(accounts::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or(JournalError::BankAccountNotFound(bank_id))?;

    let lines = load_lines(conn, header.id).await?;
    let target = BalanceEngine::bank_row_target(kind, &bank_account.code, &lines)?;

    let existing = transaction_details::Entity::find()
        .filter(transaction_details::Column::HeaderId.eq(header.id))
        .filter(transaction_details::Column::WorkstationTag.eq(BANK_TAG))
        .one(conn)
        .await?;

    let now = Utc::now().into();
    match existing {
        Some(row) => {
            let mut active: transaction_details::ActiveModel = row.into();
            active.acct_code = Set(target.acct_code);
            active.debit = Set(target.debit);
            active.credit = Set(target.credit);
            active.updated_at = Set(now);
            active.update(conn).await?;
        }
        None => {
            transaction_details::ActiveModel {
                id: Set(Uuid::new_v4()),
                header_id: Set(header.id),
                acct_code: Set(target.acct_code),
                debit: Set(target.debit),
                credit: Set(target.credit),
                workstation_tag: Set(Some(BANK_TAG.to_string())),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;
        }
    }

    Ok(())
}

/// Recomputes and persists the header's cached totals and legacy mirror.
async fn store_totals<C: ConnectionTrait>(
    conn: &C,
    kind: JournalKind,
    header: &transaction_headers::Model,
) -> Result<(), JournalError> {
    let lines = load_lines(conn, header.id).await?;
    let totals = BalanceEngine::recalc(&lines);

    let mut active: transaction_headers::ActiveModel = header.clone().into();
    active.sum_debit = Set(totals.debit);
    active.sum_credit = Set(totals.credit);
    active.amount = Set(totals.mirrored_amount(kind));
    active.is_balanced = Set(totals.balanced);
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(kind: JournalKind, flag: &str) -> transaction_headers::Model {
        let now = Utc::now().into();
        transaction_headers::Model {
            id: Uuid::new_v4(),
            company_id: 7,
            journal_kind: kind.as_str().to_string(),
            doc_no: 1,
            doc_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            counterparty_id: None,
            bank_id: None,
            check_no: None,
            explanation: String::new(),
            cancel_flag: flag.to_string(),
            sum_debit: Decimal::ZERO,
            sum_credit: Decimal::ZERO,
            amount: Decimal::ZERO,
            is_balanced: true,
            posted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ensure_active_accepts_active_flag() {
        let h = header(JournalKind::CashReceipt, "n");
        assert!(ensure_active(JournalKind::CashReceipt, &h).is_ok());
    }

    #[test]
    fn test_ensure_active_rejects_cancelled_per_module_encoding() {
        let h = header(JournalKind::CashReceipt, "c");
        assert!(matches!(
            ensure_active(JournalKind::CashReceipt, &h),
            Err(JournalError::RecordNotActive)
        ));

        let h = header(JournalKind::CashSales, "y");
        assert!(matches!(
            ensure_active(JournalKind::CashSales, &h),
            Err(JournalError::RecordNotActive)
        ));

        let h = header(JournalKind::GeneralAccounting, "1");
        assert!(matches!(
            ensure_active(JournalKind::GeneralAccounting, &h),
            Err(JournalError::RecordNotActive)
        ));
    }

    #[test]
    fn test_ensure_active_rejects_undecodable_flag() {
        let h = header(JournalKind::CashReceipt, "y");
        assert!(matches!(
            ensure_active(JournalKind::CashReceipt, &h),
            Err(JournalError::InvalidStateFlag(_))
        ));
    }

    #[test]
    fn test_error_status_mapping() {
        use canebooks_shared::AppError;

        let err = AppError::from(JournalError::NotFound(Uuid::new_v4()));
        assert_eq!(err.status_code(), 404);

        let err = AppError::from(JournalError::BankRowProtected);
        assert_eq!(err.status_code(), 422);

        let err = AppError::from(JournalError::Balance(BalanceError::BothSidesPositive));
        assert_eq!(err.status_code(), 422);

        let err = AppError::from(JournalError::Database(DbErr::Custom("boom".into())));
        assert_eq!(err.status_code(), 500);
    }
}
