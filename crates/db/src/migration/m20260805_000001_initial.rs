//! Initial database migration.
//!
//! Creates the tenant, reference, ledger, and approval tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANTS & REFERENCE DATA
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(BANKS_SQL).await?;
        db.execute_unprepared(VENDORS_SQL).await?;
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 2: LEDGER
        // ============================================================
        db.execute_unprepared(TRANSACTION_HEADERS_SQL).await?;
        db.execute_unprepared(TRANSACTION_DETAILS_SQL).await?;

        // ============================================================
        // PART 3: APPROVAL WORKFLOW
        // ============================================================
        db.execute_unprepared(APPROVALS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const BANKS_SQL: &str = r"
CREATE TABLE banks (
    id BIGSERIAL PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_banks_company ON banks(company_id);
";

const VENDORS_SQL: &str = r"
CREATE TABLE vendors (
    id BIGSERIAL PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_vendors_company ON vendors(company_id);
";

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id BIGSERIAL PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_customers_company ON customers(company_id);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id),
    code VARCHAR(32) NOT NULL,
    description VARCHAR(255) NOT NULL,
    category VARCHAR(16) NOT NULL CHECK (category IN ('asset', 'liability', 'equity', 'revenue', 'expense')),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    bank_id BIGINT REFERENCES banks(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_accounts_company_code UNIQUE (company_id, code)
);

CREATE INDEX idx_accounts_company ON accounts(company_id);
CREATE INDEX idx_accounts_bank ON accounts(company_id, bank_id) WHERE bank_id IS NOT NULL;
";

const TRANSACTION_HEADERS_SQL: &str = r"
CREATE TABLE transaction_headers (
    id UUID PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id),
    journal_kind VARCHAR(32) NOT NULL CHECK (journal_kind IN (
        'cash_receipt', 'cash_disbursement', 'cash_sales', 'cash_purchase', 'general_accounting'
    )),
    doc_no BIGINT NOT NULL,
    doc_date DATE NOT NULL,
    counterparty_id BIGINT,
    bank_id BIGINT REFERENCES banks(id),
    check_no VARCHAR(32),
    explanation TEXT NOT NULL DEFAULT '',
    cancel_flag VARCHAR(4) NOT NULL,
    sum_debit NUMERIC(18, 2) NOT NULL DEFAULT 0,
    sum_credit NUMERIC(18, 2) NOT NULL DEFAULT 0,
    amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    is_balanced BOOLEAN NOT NULL DEFAULT TRUE,
    posted BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_headers_doc_no UNIQUE (company_id, journal_kind, doc_no)
);

CREATE INDEX idx_headers_company_kind_date ON transaction_headers(company_id, journal_kind, doc_date);
";

const TRANSACTION_DETAILS_SQL: &str = r"
CREATE TABLE transaction_details (
    id UUID PRIMARY KEY,
    header_id UUID NOT NULL REFERENCES transaction_headers(id),
    acct_code VARCHAR(32) NOT NULL,
    debit NUMERIC(18, 2) NOT NULL DEFAULT 0,
    credit NUMERIC(18, 2) NOT NULL DEFAULT 0,
    workstation_tag VARCHAR(16),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_details_header ON transaction_details(header_id);
CREATE INDEX idx_details_acct ON transaction_details(acct_code);
";

const APPROVALS_SQL: &str = r"
CREATE TABLE approvals (
    id UUID PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id),
    module VARCHAR(32) NOT NULL,
    record_id UUID NOT NULL,
    action VARCHAR(16) NOT NULL CHECK (action IN ('edit', 'post', 'unpost', 'delete', 'process')),
    status VARCHAR(16) NOT NULL CHECK (status IN ('pending', 'approved', 'rejected')),
    requester_id BIGINT NOT NULL,
    approved_by BIGINT,
    expires_at TIMESTAMPTZ NOT NULL,
    consumed_at TIMESTAMPTZ,
    first_edit_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_approvals_lookup ON approvals(company_id, module, record_id, action);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS approvals;
DROP TABLE IF EXISTS transaction_details;
DROP TABLE IF EXISTS transaction_headers;
DROP TABLE IF EXISTS accounts;
DROP TABLE IF EXISTS customers;
DROP TABLE IF EXISTS vendors;
DROP TABLE IF EXISTS banks;
DROP TABLE IF EXISTS companies;
";
