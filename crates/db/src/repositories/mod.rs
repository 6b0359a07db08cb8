//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod approval;
pub mod journal;
pub mod report;

pub use approval::{ApprovalGateError, ApprovalRepository};
pub use journal::{
    CreateHeaderInput, DetailPatch, HeaderWithDetails, JournalError, JournalRepository, NewDetail,
};
pub use report::{ReportQueryError, ReportQueryRepository};
