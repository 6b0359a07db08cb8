//! Report job pipeline: scheduler and builder.
//!
//! The scheduler turns a report request into a trackable ticket; the
//! builder drives that ticket's state machine to a terminal status while
//! producing the artifact. All coordination happens through the job status
//! store; the ledger is read through the injected [`ReportDataSource`].

mod builder;
mod scheduler;
mod source;

pub use builder::BuildError;
pub use scheduler::{Dispatch, ReportRequest, ReportScheduler, ScheduleError};
pub use source::{ReportDataSource, SourceError};
