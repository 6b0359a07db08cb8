//! Approval gate persistence.
//!
//! Finds the approval row backing a gated mutation, evaluates the pure
//! usability predicate, and issues the audit/consume stamps as explicit
//! writes after authorization succeeds.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use canebooks_core::approval::{ApprovalAction, ApprovalError, ApprovalSnapshot, ApprovalStatus};
use canebooks_core::journal::JournalKind;
use canebooks_shared::AppError;

use crate::entities::approvals;

/// Error types for approval gate operations.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalGateError {
    /// The mutation is not authorized.
    #[error(transparent)]
    Forbidden(#[from] ApprovalError),

    /// No approval exists to release.
    #[error("no active approval to release")]
    NothingToRelease,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ApprovalGateError> for AppError {
    fn from(err: ApprovalGateError) -> Self {
        match &err {
            ApprovalGateError::Forbidden(_) => Self::Forbidden(err.to_string()),
            ApprovalGateError::NothingToRelease => Self::NotFound(err.to_string()),
            ApprovalGateError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Approval repository implementing the gate.
#[derive(Debug)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the most recent approval row for the record and action.
    async fn latest(
        &self,
        module: JournalKind,
        record_id: Uuid,
        company_id: i64,
        action: ApprovalAction,
    ) -> Result<Option<approvals::Model>, DbErr> {
        approvals::Entity::find()
            .filter(approvals::Column::CompanyId.eq(company_id))
            .filter(approvals::Column::Module.eq(module.as_str()))
            .filter(approvals::Column::RecordId.eq(record_id))
            .filter(approvals::Column::Action.eq(action.as_str()))
            .order_by_desc(approvals::Column::CreatedAt)
            .one(&self.db)
            .await
    }

    /// Requires a usable approval for the action; the calling mutation must
    /// run only after this returns `Ok`.
    ///
    /// On the first successful pass, `first_edit_at` is stamped as an
    /// explicit secondary write (audit trail only; the approval stays
    /// usable until released).
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when no usable approval exists.
    pub async fn require_approved(
        &self,
        module: JournalKind,
        record_id: Uuid,
        company_id: i64,
        action: ApprovalAction,
    ) -> Result<(), ApprovalGateError> {
        let row = self
            .latest(module, record_id, company_id, action)
            .await?
            .ok_or_else(|| ApprovalError::not_authorized(action))?;

        let snapshot = to_snapshot(&row);
        if !snapshot.is_usable(action, Utc::now()) {
            return Err(ApprovalError::not_authorized(action).into());
        }

        if row.first_edit_at.is_none() {
            let mut active: approvals::ActiveModel = row.into();
            active.first_edit_at = Set(Some(Utc::now().into()));
            active.update(&self.db).await?;
        }

        Ok(())
    }

    /// Explicitly ends an edit session by stamping `consumed_at` on the
    /// current approval. Single use per approval cycle.
    ///
    /// # Errors
    ///
    /// Returns `NothingToRelease` when no unconsumed approval exists.
    pub async fn release(
        &self,
        module: JournalKind,
        record_id: Uuid,
        company_id: i64,
    ) -> Result<(), ApprovalGateError> {
        let row = self
            .latest(module, record_id, company_id, ApprovalAction::Edit)
            .await?
            .filter(|r| r.consumed_at.is_none())
            .ok_or(ApprovalGateError::NothingToRelease)?;

        let mut active: approvals::ActiveModel = row.into();
        active.consumed_at = Set(Some(Utc::now().into()));
        active.update(&self.db).await?;

        Ok(())
    }
}

/// Maps a persisted row onto the pure predicate's input.
fn to_snapshot(row: &approvals::Model) -> ApprovalSnapshot {
    ApprovalSnapshot {
        status: ApprovalStatus::parse(&row.status).unwrap_or(ApprovalStatus::Rejected),
        action: ApprovalAction::parse(&row.action).unwrap_or(ApprovalAction::Process),
        expires_at: row.expires_at.to_utc(),
        consumed_at: row.consumed_at.map(|t| t.to_utc()),
        first_edit_at: row.first_edit_at.map(|t| t.to_utc()),
    }
}
