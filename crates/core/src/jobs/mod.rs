//! Report job tickets and the TTL-evicted status store.
//!
//! Every report build is tracked by an opaque ticket. Clients poll the
//! status store; the builder is the only writer for a given ticket.

mod store;
mod types;

pub use store::{JobAccessError, JobStore};
pub use types::{
    JobState, JobStatus, ReportFormat, ReportParams, ReportType, TicketKey,
};
