//! `SeaORM` entity definitions.

pub mod accounts;
pub mod approvals;
pub mod banks;
pub mod companies;
pub mod customers;
pub mod transaction_details;
pub mod transaction_headers;
pub mod vendors;
