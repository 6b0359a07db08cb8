//! Balance computation and bank-row maintenance.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::BalanceError;
use super::types::{BankRowTarget, DetailLine, TransactionTotals};
use crate::journal::JournalKind;

/// Fixed balance tolerance: debits equal credits when the absolute
/// difference is below this value. Not configurable.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Rounds a currency amount to 2 decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether two totals agree within [`BALANCE_TOLERANCE`].
#[must_use]
pub fn is_within_tolerance(debit: Decimal, credit: Decimal) -> bool {
    (debit - credit).abs() < BALANCE_TOLERANCE
}

/// Stateless engine over a transaction's detail lines.
///
/// All operations recompute from scratch; nothing here is incremental, so
/// repeated calls over unchanged lines are idempotent.
pub struct BalanceEngine;

impl BalanceEngine {
    /// Validates a line before it is inserted or updated.
    ///
    /// Enforces the debit-XOR-credit contract and, for modules that forbid
    /// it, rejects account codes already used on another line. The bank
    /// offset row is exempt from the duplicate check (it is maintained by
    /// [`BalanceEngine::bank_row_target`], not by the user).
    ///
    /// # Errors
    ///
    /// Returns `BalanceError` if the line violates the contract; the caller
    /// must not persist anything in that case.
    pub fn validate_line(
        kind: JournalKind,
        line: &DetailLine,
        existing: &[DetailLine],
    ) -> Result<(), BalanceError> {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(BalanceError::NegativeAmount);
        }
        if line.debit > Decimal::ZERO && line.credit > Decimal::ZERO {
            return Err(BalanceError::BothSidesPositive);
        }
        if line.debit <= Decimal::ZERO && line.credit <= Decimal::ZERO {
            return Err(BalanceError::NoPositiveSide);
        }

        if !line.bank_row && !kind.allows_duplicate_accounts() {
            let duplicate = existing
                .iter()
                .any(|l| !l.bank_row && l.acct_code == line.acct_code);
            if duplicate {
                return Err(BalanceError::DuplicateAccount(line.acct_code.clone()));
            }
        }

        Ok(())
    }

    /// Sums all detail lines and derives the balanced flag.
    ///
    /// An empty transaction is trivially balanced at 0 = 0.
    #[must_use]
    pub fn recalc(lines: &[DetailLine]) -> TransactionTotals {
        let debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let credit: Decimal = lines.iter().map(|l| l.credit).sum();
        let debit = round_money(debit);
        let credit = round_money(credit);

        TransactionTotals {
            debit,
            credit,
            balanced: is_within_tolerance(debit, credit),
        }
    }

    /// Computes the bank offset row that force-balances a cash transaction.
    ///
    /// Sums the non-bank lines and places the difference on the bank row:
    /// disbursements are balanced with a bank credit, receipts with a bank
    /// debit. The amount is floored at zero, so a genuinely overdrawn
    /// posting stays unbalanced instead of carrying a negative bank line.
    ///
    /// Callers must apply the returned target *before* [`BalanceEngine::recalc`]
    /// so the cached totals include the corrected bank amount.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceError::NoBankRow`] for modules without a bank row.
    pub fn bank_row_target(
        kind: JournalKind,
        bank_acct_code: &str,
        lines: &[DetailLine],
    ) -> Result<BankRowTarget, BalanceError> {
        if !kind.has_bank_row() {
            return Err(BalanceError::NoBankRow);
        }

        let debit: Decimal = lines.iter().filter(|l| !l.bank_row).map(|l| l.debit).sum();
        let credit: Decimal = lines
            .iter()
            .filter(|l| !l.bank_row)
            .map(|l| l.credit)
            .sum();

        let target = match kind {
            JournalKind::CashDisbursement => BankRowTarget {
                acct_code: bank_acct_code.to_string(),
                debit: Decimal::ZERO,
                credit: round_money((debit - credit).max(Decimal::ZERO)),
            },
            JournalKind::CashReceipt => BankRowTarget {
                acct_code: bank_acct_code.to_string(),
                debit: round_money((credit - debit).max(Decimal::ZERO)),
                credit: Decimal::ZERO,
            },
            _ => unreachable!("guarded by has_bank_row"),
        };

        Ok(target)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn money() -> impl Strategy<Value = Decimal> {
        // Cents up to 10_000_000.00
        (0i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        // Recomputation from scratch is idempotent.
        #[test]
        fn prop_recalc_idempotent(amounts in proptest::collection::vec((money(), any::<bool>()), 0..12)) {
            let lines: Vec<DetailLine> = amounts
                .iter()
                .enumerate()
                .map(|(i, (amount, is_debit))| {
                    if *is_debit {
                        DetailLine::new(format!("{:04}", 1000 + i), *amount, Decimal::ZERO)
                    } else {
                        DetailLine::new(format!("{:04}", 1000 + i), Decimal::ZERO, *amount)
                    }
                })
                .collect();

            let first = BalanceEngine::recalc(&lines);
            let second = BalanceEngine::recalc(&lines);
            prop_assert_eq!(first, second);
        }

        // balanced is exactly abs(debit - credit) < 0.005.
        #[test]
        fn prop_balanced_matches_tolerance(debit in money(), credit in money()) {
            let lines = vec![
                DetailLine::new("1000", debit, Decimal::ZERO),
                DetailLine::new("2000", Decimal::ZERO, credit),
            ];
            let totals = BalanceEngine::recalc(&lines);
            let expected = (totals.debit - totals.credit).abs() < BALANCE_TOLERANCE;
            prop_assert_eq!(totals.balanced, expected);
        }

        // The bank row never goes negative, and with a zero-or-positive gap
        // it balances the transaction exactly.
        #[test]
        fn prop_bank_row_never_negative(amounts in proptest::collection::vec((money(), any::<bool>()), 1..10)) {
            let lines: Vec<DetailLine> = amounts
                .iter()
                .enumerate()
                .map(|(i, (amount, is_debit))| {
                    if *is_debit {
                        DetailLine::new(format!("{:04}", 6000 + i), *amount, Decimal::ZERO)
                    } else {
                        DetailLine::new(format!("{:04}", 2000 + i), Decimal::ZERO, *amount)
                    }
                })
                .collect();

            let target =
                BalanceEngine::bank_row_target(JournalKind::CashDisbursement, "1000", &lines)
                    .unwrap();
            prop_assert!(target.credit >= Decimal::ZERO);
            prop_assert_eq!(target.debit, Decimal::ZERO);
        }
    }
}
