//! Balance engine domain types.

use rust_decimal::Decimal;

use crate::journal::JournalKind;

/// A single GL posting line, as seen by the balance engine.
///
/// This is the in-memory contract; the persistence layer maps its legacy
/// `workstation_tag` column onto [`DetailLine::bank_row`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLine {
    /// The posted account code.
    pub acct_code: String,
    /// Debit amount (zero when the line is a credit).
    pub debit: Decimal,
    /// Credit amount (zero when the line is a debit).
    pub credit: Decimal,
    /// Whether this is the system-maintained bank offset row.
    pub bank_row: bool,
}

impl DetailLine {
    /// Creates an ordinary (non-bank) line.
    #[must_use]
    pub fn new(acct_code: impl Into<String>, debit: Decimal, credit: Decimal) -> Self {
        Self {
            acct_code: acct_code.into(),
            debit,
            credit,
            bank_row: false,
        }
    }
}

/// Recomputed transaction totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionTotals {
    /// Total debit amount, rounded to 2 decimal places.
    pub debit: Decimal,
    /// Total credit amount, rounded to 2 decimal places.
    pub credit: Decimal,
    /// Whether debits equal credits within the fixed tolerance.
    pub balanced: bool,
}

impl TransactionTotals {
    /// The legacy `amount` column value for the given module.
    ///
    /// Receipt-side modules mirror the credit total, the others the debit
    /// total.
    #[must_use]
    pub fn mirrored_amount(&self, kind: JournalKind) -> Decimal {
        if kind.mirrors_credit() {
            self.credit
        } else {
            self.debit
        }
    }
}

/// The desired state of the bank offset row after adjustment.
///
/// The persistence layer creates the row if absent, or rewrites the account
/// code and amounts of the existing one. The row is never produced with a
/// negative amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankRowTarget {
    /// GL account code representing the selected bank.
    pub acct_code: String,
    /// Debit amount (receipts force-balance on the debit side).
    pub debit: Decimal,
    /// Credit amount (disbursements force-balance on the credit side).
    pub credit: Decimal,
}
