//! `SeaORM` Entity for the transaction headers table.
//!
//! One table serves all five journal modules; `journal_kind` selects the
//! module and `cancel_flag` carries that module's legacy state encoding.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_headers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: i64,
    pub journal_kind: String,
    /// Sequential human-facing number, scoped per company + journal.
    pub doc_no: i64,
    pub doc_date: Date,
    /// Customer (receipt-side modules) or vendor (payment-side modules).
    pub counterparty_id: Option<i64>,
    /// Selected bank for cash modules.
    pub bank_id: Option<i64>,
    /// Check number, cash disbursements only.
    pub check_no: Option<String>,
    pub explanation: String,
    /// Legacy per-module cancellation encoding.
    pub cancel_flag: String,
    /// Derived: recomputed after every detail mutation, never hand-edited.
    pub sum_debit: Decimal,
    /// Derived: recomputed after every detail mutation, never hand-edited.
    pub sum_credit: Decimal,
    /// Legacy mirror of one totals side, per module convention.
    pub amount: Decimal,
    /// Derived: not authoritative, recomputed alongside the sums.
    pub is_balanced: bool,
    pub posted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
    #[sea_orm(has_many = "super::transaction_details::Entity")]
    TransactionDetails,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::transaction_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
