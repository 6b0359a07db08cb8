//! `SeaORM` Entity for the approvals table.
//!
//! A row is a time-boxed, single-use authorization token gating one
//! mutation on one record.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approvals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: i64,
    /// Journal module the gated record belongs to.
    pub module: String,
    pub record_id: Uuid,
    /// Authorized action: edit/post/unpost/delete/process.
    pub action: String,
    /// Review status: pending/approved/rejected.
    pub status: String,
    pub requester_id: i64,
    pub approved_by: Option<i64>,
    pub expires_at: DateTimeWithTimeZone,
    /// Explicit release timestamp; set once per approval cycle.
    pub consumed_at: Option<DateTimeWithTimeZone>,
    /// First gated edit, audit trail only.
    pub first_edit_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
