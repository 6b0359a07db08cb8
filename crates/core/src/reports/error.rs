//! Report aggregation error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while aggregating report data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    /// The aggregate debit and credit totals disagree.
    ///
    /// Surfaced as a distinct, user-facing outcome; the builder must not
    /// render a financial artifact over unbalanced data.
    #[error("ledger data is unbalanced: debits {debit} do not equal credits {credit}")]
    Unbalanced {
        /// Aggregate debit total.
        debit: Decimal,
        /// Aggregate credit total.
        credit: Decimal,
    },
}
