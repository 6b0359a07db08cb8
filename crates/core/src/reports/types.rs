//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::journal::JournalKind;

/// Financial-statement category of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    /// Asset accounts.
    Asset,
    /// Liability accounts.
    Liability,
    /// Equity accounts.
    Equity,
    /// Revenue accounts.
    Revenue,
    /// Expense accounts.
    Expense,
}

impl AccountCategory {
    /// Stable persisted identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Parses a persisted identifier.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Display heading.
    #[must_use]
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Asset => "Assets",
            Self::Liability => "Liabilities",
            Self::Equity => "Equity",
            Self::Revenue => "Revenue",
            Self::Expense => "Expenses",
        }
    }
}

/// One GL posting line as queried for reports, with display joins applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Transaction date.
    pub date: NaiveDate,
    /// Source journal module.
    pub journal: JournalKind,
    /// Sequential document number within the module.
    pub doc_no: i64,
    /// Posted account code.
    pub acct_code: String,
    /// Account description.
    pub acct_description: String,
    /// Counterparty display name (customer/vendor), when present.
    pub counterparty: Option<String>,
    /// Transaction explanation.
    pub explanation: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

impl LedgerRow {
    /// Formatted document reference, e.g. `CR-000042`.
    #[must_use]
    pub fn doc_ref(&self) -> String {
        self.journal.format_doc_no(self.doc_no)
    }
}

/// Per-account debit/credit totals for the trial balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Account code.
    pub acct_code: String,
    /// Account description.
    pub description: String,
    /// Statement category.
    pub category: AccountCategory,
    /// Total debits in range.
    pub debit: Decimal,
    /// Total credits in range.
    pub credit: Decimal,
}

/// One issued check, for the check register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRow {
    /// Check date.
    pub date: NaiveDate,
    /// Check number.
    pub check_no: String,
    /// Disbursement document number.
    pub doc_no: i64,
    /// Payee display name.
    pub payee: Option<String>,
    /// Check amount.
    pub amount: Decimal,
}

/// A row of an account's ledger section with its running balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlRow {
    /// Transaction date.
    pub date: NaiveDate,
    /// Formatted document reference.
    pub doc_ref: String,
    /// Transaction explanation.
    pub explanation: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Running balance (debits minus credits) within the section.
    pub balance: Decimal,
}

/// One account's section of the general ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSection {
    /// Account code.
    pub acct_code: String,
    /// Account description.
    pub description: String,
    /// Chronological rows with running balances.
    pub rows: Vec<GlRow>,
    /// Section debit total.
    pub total_debit: Decimal,
    /// Section credit total.
    pub total_credit: Decimal,
    /// Closing balance of the section.
    pub ending_balance: Decimal,
}

/// General ledger report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralLedgerReport {
    /// Per-account sections ordered by account code.
    pub sections: Vec<AccountSection>,
    /// Grand debit total.
    pub total_debit: Decimal,
    /// Grand credit total.
    pub total_credit: Decimal,
}

/// One trial balance line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account code.
    pub acct_code: String,
    /// Account description.
    pub description: String,
    /// Debit total.
    pub debit: Decimal,
    /// Credit total.
    pub credit: Decimal,
}

/// Trial balance rows bucketed under one statement category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceSection {
    /// Statement category.
    pub category: AccountCategory,
    /// Account rows in code order.
    pub rows: Vec<TrialBalanceRow>,
    /// Category debit subtotal.
    pub subtotal_debit: Decimal,
    /// Category credit subtotal.
    pub subtotal_credit: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Category sections in statement order.
    pub sections: Vec<TrialBalanceSection>,
    /// Grand debit total.
    pub total_debit: Decimal,
    /// Grand credit total.
    pub total_credit: Decimal,
    /// Whether the grand totals agree within tolerance.
    pub is_balanced: bool,
}

/// Chronological journal book (receipts, disbursements, general journal,
/// AP/AR journals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalBookReport {
    /// Rows in date, document order.
    pub rows: Vec<LedgerRow>,
    /// Grand debit total.
    pub total_debit: Decimal,
    /// Grand credit total.
    pub total_credit: Decimal,
}

/// Check register report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRegisterReport {
    /// Checks in date, check-number order.
    pub rows: Vec<CheckRow>,
    /// Sum of check amounts.
    pub total_amount: Decimal,
}

/// Format-agnostic tabular layout handed to the renderers.
///
/// Rendering detail (fonts, page layout) is an opaque concern of the
/// `render` module; aggregation only decides content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTable {
    /// Report title.
    pub title: String,
    /// Subtitle (period, scope).
    pub subtitle: String,
    /// Column headings.
    pub columns: Vec<String>,
    /// Data rows; section headings are single-cell rows.
    pub rows: Vec<Vec<String>>,
    /// Footer cells (totals line).
    pub footer: Vec<String>,
}

pub(crate) fn format_amount(amount: Decimal) -> String {
    format!("{amount:.2}")
}

impl GeneralLedgerReport {
    /// Flattens into the generic render table.
    #[must_use]
    pub fn to_table(&self, subtitle: String) -> ReportTable {
        let mut rows = Vec::new();
        for section in &self.sections {
            rows.push(vec![format!(
                "{} - {}",
                section.acct_code, section.description
            )]);
            for row in &section.rows {
                rows.push(vec![
                    row.date.to_string(),
                    row.doc_ref.clone(),
                    row.explanation.clone(),
                    format_amount(row.debit),
                    format_amount(row.credit),
                    format_amount(row.balance),
                ]);
            }
            rows.push(vec![
                String::new(),
                String::new(),
                "Account total".to_string(),
                format_amount(section.total_debit),
                format_amount(section.total_credit),
                format_amount(section.ending_balance),
            ]);
        }

        ReportTable {
            title: "General Ledger".to_string(),
            subtitle,
            columns: ["Date", "Reference", "Explanation", "Debit", "Credit", "Balance"]
                .map(String::from)
                .to_vec(),
            rows,
            footer: vec![
                String::new(),
                String::new(),
                "Grand total".to_string(),
                format_amount(self.total_debit),
                format_amount(self.total_credit),
                String::new(),
            ],
        }
    }
}

impl TrialBalanceReport {
    /// Flattens into the generic render table.
    #[must_use]
    pub fn to_table(&self, subtitle: String) -> ReportTable {
        let mut rows = Vec::new();
        for section in &self.sections {
            rows.push(vec![section.category.heading().to_string()]);
            for row in &section.rows {
                rows.push(vec![
                    row.acct_code.clone(),
                    row.description.clone(),
                    format_amount(row.debit),
                    format_amount(row.credit),
                ]);
            }
            rows.push(vec![
                String::new(),
                "Subtotal".to_string(),
                format_amount(section.subtotal_debit),
                format_amount(section.subtotal_credit),
            ]);
        }

        ReportTable {
            title: "Trial Balance".to_string(),
            subtitle,
            columns: ["Account", "Description", "Debit", "Credit"]
                .map(String::from)
                .to_vec(),
            rows,
            footer: vec![
                String::new(),
                "Total".to_string(),
                format_amount(self.total_debit),
                format_amount(self.total_credit),
            ],
        }
    }
}

impl JournalBookReport {
    /// Flattens into the generic render table.
    #[must_use]
    pub fn to_table(&self, title: String, subtitle: String) -> ReportTable {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.date.to_string(),
                    row.doc_ref(),
                    row.acct_code.clone(),
                    row.acct_description.clone(),
                    row.counterparty.clone().unwrap_or_default(),
                    row.explanation.clone(),
                    format_amount(row.debit),
                    format_amount(row.credit),
                ]
            })
            .collect();

        ReportTable {
            title,
            subtitle,
            columns: [
                "Date",
                "Reference",
                "Account",
                "Description",
                "Counterparty",
                "Explanation",
                "Debit",
                "Credit",
            ]
            .map(String::from)
            .to_vec(),
            rows,
            footer: vec![
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                "Total".to_string(),
                format_amount(self.total_debit),
                format_amount(self.total_credit),
            ],
        }
    }
}

impl CheckRegisterReport {
    /// Flattens into the generic render table.
    #[must_use]
    pub fn to_table(&self, subtitle: String) -> ReportTable {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.date.to_string(),
                    row.check_no.clone(),
                    JournalKind::CashDisbursement.format_doc_no(row.doc_no),
                    row.payee.clone().unwrap_or_default(),
                    format_amount(row.amount),
                ]
            })
            .collect();

        ReportTable {
            title: "Check Register".to_string(),
            subtitle,
            columns: ["Date", "Check No", "Reference", "Payee", "Amount"]
                .map(String::from)
                .to_vec(),
            rows,
            footer: vec![
                String::new(),
                String::new(),
                String::new(),
                "Total".to_string(),
                format_amount(self.total_amount),
            ],
        }
    }
}
