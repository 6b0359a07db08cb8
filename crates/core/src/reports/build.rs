//! Report aggregation functions.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{
    AccountSection, AccountSummary, CheckRegisterReport, CheckRow, GeneralLedgerReport, GlRow,
    JournalBookReport, LedgerRow, TrialBalanceReport, TrialBalanceRow, TrialBalanceSection,
};
use crate::balance::{is_within_tolerance, round_money};

/// Refuses unbalanced aggregates.
///
/// Shares the balance engine's tolerance; a financial artifact must never
/// be rendered over data where debits and credits disagree.
///
/// # Errors
///
/// Returns [`ReportError::Unbalanced`] with both totals.
pub fn verify_balanced_aggregate(debit: Decimal, credit: Decimal) -> Result<(), ReportError> {
    if is_within_tolerance(debit, credit) {
        Ok(())
    } else {
        Err(ReportError::Unbalanced { debit, credit })
    }
}

/// Builds the general ledger: rows grouped per account with running
/// balances, accounts ordered by code, rows ordered by date then document.
#[must_use]
pub fn build_general_ledger(mut rows: Vec<LedgerRow>) -> GeneralLedgerReport {
    rows.sort_by(|a, b| {
        a.acct_code
            .cmp(&b.acct_code)
            .then(a.date.cmp(&b.date))
            .then(a.doc_no.cmp(&b.doc_no))
    });

    let mut sections: Vec<AccountSection> = Vec::new();
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for row in rows {
        total_debit += row.debit;
        total_credit += row.credit;

        let needs_new = sections
            .last()
            .is_none_or(|s| s.acct_code != row.acct_code);
        if needs_new {
            sections.push(AccountSection {
                acct_code: row.acct_code.clone(),
                description: row.acct_description.clone(),
                rows: Vec::new(),
                total_debit: Decimal::ZERO,
                total_credit: Decimal::ZERO,
                ending_balance: Decimal::ZERO,
            });
        }

        // last() above guarantees a section exists here
        if let Some(section) = sections.last_mut() {
            section.total_debit += row.debit;
            section.total_credit += row.credit;
            let balance = section
                .rows
                .last()
                .map_or(Decimal::ZERO, |r| r.balance)
                + row.debit
                - row.credit;
            section.rows.push(GlRow {
                date: row.date,
                doc_ref: row.doc_ref(),
                explanation: row.explanation,
                debit: row.debit,
                credit: row.credit,
                balance,
            });
            section.ending_balance = balance;
        }
    }

    for section in &mut sections {
        section.total_debit = round_money(section.total_debit);
        section.total_credit = round_money(section.total_credit);
        section.ending_balance = round_money(section.ending_balance);
    }

    GeneralLedgerReport {
        sections,
        total_debit: round_money(total_debit),
        total_credit: round_money(total_credit),
    }
}

/// Builds the trial balance from per-account summaries, bucketed by
/// statement category in statement order.
#[must_use]
pub fn build_trial_balance(summaries: Vec<AccountSummary>) -> TrialBalanceReport {
    let mut buckets: BTreeMap<_, Vec<AccountSummary>> = BTreeMap::new();
    for summary in summaries {
        buckets.entry(summary.category).or_default().push(summary);
    }

    let mut sections = Vec::new();
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for (category, mut accounts) in buckets {
        accounts.sort_by(|a, b| a.acct_code.cmp(&b.acct_code));

        let subtotal_debit: Decimal = accounts.iter().map(|a| a.debit).sum();
        let subtotal_credit: Decimal = accounts.iter().map(|a| a.credit).sum();
        total_debit += subtotal_debit;
        total_credit += subtotal_credit;

        sections.push(TrialBalanceSection {
            category,
            rows: accounts
                .into_iter()
                .map(|a| TrialBalanceRow {
                    acct_code: a.acct_code,
                    description: a.description,
                    debit: round_money(a.debit),
                    credit: round_money(a.credit),
                })
                .collect(),
            subtotal_debit: round_money(subtotal_debit),
            subtotal_credit: round_money(subtotal_credit),
        });
    }

    let total_debit = round_money(total_debit);
    let total_credit = round_money(total_credit);

    TrialBalanceReport {
        sections,
        total_debit,
        total_credit,
        is_balanced: is_within_tolerance(total_debit, total_credit),
    }
}

/// Builds a chronological journal book.
#[must_use]
pub fn build_journal_book(mut rows: Vec<LedgerRow>) -> JournalBookReport {
    rows.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.doc_no.cmp(&b.doc_no))
            .then(a.acct_code.cmp(&b.acct_code))
    });

    let total_debit: Decimal = rows.iter().map(|r| r.debit).sum();
    let total_credit: Decimal = rows.iter().map(|r| r.credit).sum();

    JournalBookReport {
        rows,
        total_debit: round_money(total_debit),
        total_credit: round_money(total_credit),
    }
}

/// Builds the check register: chronological listing of issued checks.
#[must_use]
pub fn build_check_register(mut rows: Vec<CheckRow>) -> CheckRegisterReport {
    rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.check_no.cmp(&b.check_no)));

    let total_amount: Decimal = rows.iter().map(|r| r.amount).sum();

    CheckRegisterReport {
        rows,
        total_amount: round_money(total_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::JournalKind;
    use crate::reports::types::AccountCategory;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn row(
        day: u32,
        doc_no: i64,
        acct: &str,
        debit: Decimal,
        credit: Decimal,
    ) -> LedgerRow {
        LedgerRow {
            date: date(day),
            journal: JournalKind::GeneralAccounting,
            doc_no,
            acct_code: acct.to_string(),
            acct_description: format!("Account {acct}"),
            counterparty: None,
            explanation: "entry".to_string(),
            debit,
            credit,
        }
    }

    #[test]
    fn test_verify_balanced_within_tolerance() {
        assert!(verify_balanced_aggregate(dec!(100.00), dec!(100.004)).is_ok());
    }

    #[test]
    fn test_verify_unbalanced_reports_both_totals() {
        let err = verify_balanced_aggregate(dec!(100), dec!(150)).unwrap_err();
        assert_eq!(
            err,
            ReportError::Unbalanced {
                debit: dec!(100),
                credit: dec!(150),
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("unbalanced"));
        assert!(msg.contains("100"));
        assert!(msg.contains("150"));
    }

    #[test]
    fn test_general_ledger_running_balance() {
        let rows = vec![
            row(2, 2, "1010", dec!(50), dec!(0)),
            row(1, 1, "1010", dec!(100), dec!(0)),
            row(3, 3, "1010", dec!(0), dec!(30)),
        ];
        let report = build_general_ledger(rows);
        assert_eq!(report.sections.len(), 1);

        let section = &report.sections[0];
        // Chronological within the account.
        assert_eq!(section.rows[0].balance, dec!(100));
        assert_eq!(section.rows[1].balance, dec!(150));
        assert_eq!(section.rows[2].balance, dec!(120));
        assert_eq!(section.ending_balance, dec!(120));
        assert_eq!(section.total_debit, dec!(150));
        assert_eq!(section.total_credit, dec!(30));
    }

    #[test]
    fn test_general_ledger_sections_ordered_by_code() {
        let rows = vec![
            row(1, 1, "4000", dec!(0), dec!(10)),
            row(1, 1, "1010", dec!(10), dec!(0)),
        ];
        let report = build_general_ledger(rows);
        assert_eq!(report.sections[0].acct_code, "1010");
        assert_eq!(report.sections[1].acct_code, "4000");
        assert_eq!(report.total_debit, dec!(10));
        assert_eq!(report.total_credit, dec!(10));
    }

    #[test]
    fn test_general_ledger_empty() {
        let report = build_general_ledger(vec![]);
        assert!(report.sections.is_empty());
        assert_eq!(report.total_debit, Decimal::ZERO);
        assert_eq!(report.total_credit, Decimal::ZERO);
    }

    fn summary(code: &str, cat: AccountCategory, debit: Decimal, credit: Decimal) -> AccountSummary {
        AccountSummary {
            acct_code: code.to_string(),
            description: format!("Account {code}"),
            category: cat,
            debit,
            credit,
        }
    }

    #[test]
    fn test_trial_balance_buckets_by_category() {
        let report = build_trial_balance(vec![
            summary("4000", AccountCategory::Revenue, dec!(0), dec!(500)),
            summary("1010", AccountCategory::Asset, dec!(500), dec!(0)),
            summary("1000", AccountCategory::Asset, dec!(250), dec!(250)),
        ]);

        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].category, AccountCategory::Asset);
        // Code order within the category.
        assert_eq!(report.sections[0].rows[0].acct_code, "1000");
        assert_eq!(report.sections[0].rows[1].acct_code, "1010");
        assert_eq!(report.sections[0].subtotal_debit, dec!(750));
        assert_eq!(report.sections[1].category, AccountCategory::Revenue);

        assert_eq!(report.total_debit, dec!(750));
        assert_eq!(report.total_credit, dec!(750));
        assert!(report.is_balanced);
    }

    #[test]
    fn test_trial_balance_unbalanced_flag() {
        let report = build_trial_balance(vec![summary(
            "1010",
            AccountCategory::Asset,
            dec!(100),
            dec!(40),
        )]);
        assert!(!report.is_balanced);
    }

    #[test]
    fn test_journal_book_chronological_with_totals() {
        let rows = vec![
            row(5, 9, "2000", dec!(0), dec!(75)),
            row(1, 3, "1010", dec!(75), dec!(0)),
        ];
        let report = build_journal_book(rows);
        assert_eq!(report.rows[0].date, date(1));
        assert_eq!(report.rows[1].date, date(5));
        assert_eq!(report.total_debit, dec!(75));
        assert_eq!(report.total_credit, dec!(75));
    }

    #[test]
    fn test_check_register_sorted_and_totalled() {
        let rows = vec![
            CheckRow {
                date: date(9),
                check_no: "1002".to_string(),
                doc_no: 2,
                payee: Some("Acme Supply".to_string()),
                amount: dec!(300),
            },
            CheckRow {
                date: date(3),
                check_no: "1001".to_string(),
                doc_no: 1,
                payee: None,
                amount: dec!(120.5),
            },
        ];
        let report = build_check_register(rows);
        assert_eq!(report.rows[0].check_no, "1001");
        assert_eq!(report.rows[1].check_no, "1002");
        assert_eq!(report.total_amount, dec!(420.50));
    }

    #[test]
    fn test_tables_flatten() {
        let gl = build_general_ledger(vec![row(1, 1, "1010", dec!(10), dec!(0))]);
        let table = gl.to_table("January 2025".to_string());
        assert_eq!(table.columns.len(), 6);
        // Section heading + data row + account total.
        assert_eq!(table.rows.len(), 3);

        let tb = build_trial_balance(vec![summary(
            "1010",
            AccountCategory::Asset,
            dec!(10),
            dec!(10),
        )]);
        let table = tb.to_table("January 2025".to_string());
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.footer.last().unwrap(), "10.00");
    }
}
