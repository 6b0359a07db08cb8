//! Balance engine error types.

use thiserror::Error;

/// Errors raised while validating or balancing detail rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    /// Both debit and credit were positive on one line.
    #[error("exactly one of debit/credit must be positive, not both")]
    BothSidesPositive,

    /// Neither side carried a positive amount.
    #[error("exactly one of debit/credit must be positive")]
    NoPositiveSide,

    /// A negative amount was supplied.
    #[error("debit and credit amounts must not be negative")]
    NegativeAmount,

    /// The account code is already used on another line of this transaction.
    #[error("account {0} is already used in this transaction")]
    DuplicateAccount(String),

    /// Bank-row maintenance was requested for a module without a bank row.
    #[error("journal module has no bank offset row")]
    NoBankRow,
}
