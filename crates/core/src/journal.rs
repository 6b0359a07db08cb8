//! Journal module kinds and per-module policies.
//!
//! The five journal modules share one header/detail data model; everything
//! that differs between them (document numbering, which side the legacy
//! `amount` column mirrors, duplicate-account policy, bank-row maintenance,
//! cancellation-flag encoding) is captured here so the rest of the system
//! can stay module-agnostic.

use serde::{Deserialize, Serialize};

/// The journal module a transaction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    /// Cash receipts journal.
    CashReceipt,
    /// Cash disbursements journal.
    CashDisbursement,
    /// Sales journal.
    CashSales,
    /// Purchases journal.
    CashPurchase,
    /// General accounting journal.
    GeneralAccounting,
}

/// Logical record state shared by all journal modules.
///
/// The persisted encodings differ per module (see [`JournalKind::encode_state`]);
/// this is the single in-memory contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    /// Normal, visible record.
    Active,
    /// Soft-cancelled; details are retained.
    Cancelled,
    /// Hidden from lists but retained.
    Deleted,
}

impl JournalKind {
    /// All journal kinds, in document-prefix order.
    pub const ALL: [Self; 5] = [
        Self::CashReceipt,
        Self::CashDisbursement,
        Self::CashSales,
        Self::CashPurchase,
        Self::GeneralAccounting,
    ];

    /// Stable identifier used in persisted rows.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CashReceipt => "cash_receipt",
            Self::CashDisbursement => "cash_disbursement",
            Self::CashSales => "cash_sales",
            Self::CashPurchase => "cash_purchase",
            Self::GeneralAccounting => "general_accounting",
        }
    }

    /// URL path segment for this kind.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::CashReceipt => "cash-receipt",
            Self::CashDisbursement => "cash-disbursement",
            Self::CashSales => "cash-sales",
            Self::CashPurchase => "cash-purchase",
            Self::GeneralAccounting => "general-accounting",
        }
    }

    /// Parses a kind from either its persisted identifier or URL slug.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash_receipt" | "cash-receipt" => Some(Self::CashReceipt),
            "cash_disbursement" | "cash-disbursement" => Some(Self::CashDisbursement),
            "cash_sales" | "cash-sales" => Some(Self::CashSales),
            "cash_purchase" | "cash-purchase" => Some(Self::CashPurchase),
            "general_accounting" | "general-accounting" => Some(Self::GeneralAccounting),
            _ => None,
        }
    }

    /// Document number prefix (CR/CD/CS/CP/GA).
    #[must_use]
    pub fn doc_prefix(&self) -> &'static str {
        match self {
            Self::CashReceipt => "CR",
            Self::CashDisbursement => "CD",
            Self::CashSales => "CS",
            Self::CashPurchase => "CP",
            Self::GeneralAccounting => "GA",
        }
    }

    /// Formats a sequential document number with the module prefix.
    #[must_use]
    pub fn format_doc_no(&self, n: i64) -> String {
        format!("{}-{n:06}", self.doc_prefix())
    }

    /// Whether the legacy `amount` column mirrors the credit total.
    ///
    /// Receipt-side modules mirror the credit total; the others mirror the
    /// debit total. This follows normal-balance conventions and must be
    /// preserved per module.
    #[must_use]
    pub fn mirrors_credit(&self) -> bool {
        matches!(self, Self::CashReceipt | Self::CashSales)
    }

    /// Whether one account code may appear on several lines of the same
    /// transaction. Only general accounting permits this.
    #[must_use]
    pub fn allows_duplicate_accounts(&self) -> bool {
        matches!(self, Self::GeneralAccounting)
    }

    /// Whether this module carries the system-maintained bank offset row.
    #[must_use]
    pub fn has_bank_row(&self) -> bool {
        matches!(self, Self::CashReceipt | Self::CashDisbursement)
    }

    /// Encodes a [`RecordState`] into this module's legacy flag value.
    ///
    /// The encodings are intentionally left un-unified on disk; only the
    /// in-memory contract is shared.
    #[must_use]
    pub fn encode_state(&self, state: RecordState) -> &'static str {
        match self {
            Self::CashReceipt | Self::CashDisbursement => match state {
                RecordState::Active => "n",
                RecordState::Cancelled => "c",
                RecordState::Deleted => "d",
            },
            Self::CashSales | Self::CashPurchase => match state {
                RecordState::Active => "n",
                RecordState::Cancelled => "y",
                RecordState::Deleted => "d",
            },
            Self::GeneralAccounting => match state {
                RecordState::Active => "0",
                RecordState::Cancelled => "1",
                RecordState::Deleted => "2",
            },
        }
    }

    /// Decodes this module's legacy flag value into a [`RecordState`].
    #[must_use]
    pub fn decode_state(&self, flag: &str) -> Option<RecordState> {
        match self {
            Self::CashReceipt | Self::CashDisbursement => match flag {
                "n" => Some(RecordState::Active),
                "c" => Some(RecordState::Cancelled),
                "d" => Some(RecordState::Deleted),
                _ => None,
            },
            Self::CashSales | Self::CashPurchase => match flag {
                "n" => Some(RecordState::Active),
                "y" => Some(RecordState::Cancelled),
                "d" => Some(RecordState::Deleted),
                _ => None,
            },
            Self::GeneralAccounting => match flag {
                "0" => Some(RecordState::Active),
                "1" => Some(RecordState::Cancelled),
                "2" => Some(RecordState::Deleted),
                _ => None,
            },
        }
    }
}
