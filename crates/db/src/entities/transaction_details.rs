//! `SeaORM` Entity for the transaction details table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Legacy tag value marking the system-maintained bank offset row.
pub const BANK_TAG: &str = "BANK";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub header_id: Uuid,
    pub acct_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Legacy tag column; `BANK` marks the bank offset row.
    pub workstation_tag: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether this row is the system-maintained bank offset row.
    #[must_use]
    pub fn is_bank_row(&self) -> bool {
        self.workstation_tag.as_deref() == Some(BANK_TAG)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transaction_headers::Entity",
        from = "Column::HeaderId",
        to = "super::transaction_headers::Column::Id"
    )]
    TransactionHeaders,
}

impl Related<super::transaction_headers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionHeaders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
