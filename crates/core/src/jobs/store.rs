//! TTL-evicted job status store.
//!
//! Single source of truth for ticket progress, status, and artifact
//! location. One builder execution writes a given ticket; many pollers
//! read it. Entries expire on their own after the configured TTL; nothing
//! deletes them on read.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use thiserror::Error;

use super::types::{JobState, JobStatus, TicketKey};

/// Default maximum number of tracked tickets.
const DEFAULT_CAPACITY: u64 = 512;

/// Default ticket time-to-live (3 hours).
const DEFAULT_TTL_SECS: u64 = 10_800;

/// Failure modes of a scoped job-state read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobAccessError {
    /// The ticket is unknown or has expired.
    #[error("unknown or expired ticket")]
    NotFound,

    /// The ticket belongs to a different company.
    #[error("ticket belongs to a different company")]
    Forbidden,
}

/// Job status store keyed by [`TicketKey`].
///
/// Thread-safe; suitable for concurrent pollers. State values are shared
/// as `Arc` snapshots so readers never observe a partially written state.
#[derive(Clone)]
pub struct JobStore {
    cache: Cache<TicketKey, Arc<JobState>>,
}

impl JobStore {
    /// Creates a store with default capacity and TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a store with explicit capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Seeds the initial state for a freshly minted ticket.
    pub fn seed(&self, key: TicketKey, state: JobState) {
        self.cache.insert(key, Arc::new(state));
    }

    /// Reads a ticket's state without tenant scoping.
    #[must_use]
    pub fn get(&self, key: &TicketKey) -> Option<Arc<JobState>> {
        self.cache.get(key)
    }

    /// Reads a ticket's state, enforcing the tenant scope.
    ///
    /// Tenant isolation is checked on every read, not just at creation.
    ///
    /// # Errors
    ///
    /// `NotFound` when the ticket is unknown or expired; `Forbidden` when
    /// the stored company does not match the caller's scope.
    pub fn get_scoped(
        &self,
        key: &TicketKey,
        company_id: i64,
    ) -> Result<Arc<JobState>, JobAccessError> {
        let state = self.cache.get(key).ok_or(JobAccessError::NotFound)?;
        if state.company_id != company_id {
            return Err(JobAccessError::Forbidden);
        }
        Ok(state)
    }

    /// Transitions a queued job to running.
    pub fn mark_running(&self, key: &TicketKey) {
        self.update(key, |state| {
            state.status = JobStatus::Running;
        });
    }

    /// Raises the progress percentage. Progress never decreases and is
    /// capped at 100.
    pub fn set_progress(&self, key: &TicketKey, progress: u8) {
        self.update(key, |state| {
            state.progress = state.progress.max(progress.min(100));
        });
    }

    /// Terminal transition to done with the artifact reference.
    pub fn complete(&self, key: &TicketKey, file: String, filename: String) {
        self.update(key, |state| {
            state.status = JobStatus::Done;
            state.progress = 100;
            state.file = Some(file);
            state.filename = Some(filename);
            state.error = None;
        });
    }

    /// Terminal transition to error with a non-empty description.
    ///
    /// An errored job never references an artifact.
    pub fn fail(&self, key: &TicketKey, message: impl Into<String>) {
        let message = message.into();
        self.update(key, move |state| {
            state.status = JobStatus::Error;
            state.file = None;
            state.filename = None;
            state.error = Some(if message.is_empty() {
                "report generation failed".to_string()
            } else {
                message
            });
        });
    }

    /// Number of tracked tickets.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Applies a mutation unless the current state is terminal.
    ///
    /// There is exactly one writer per ticket, so read-modify-write is
    /// race-free here; the terminal guard makes illegal transitions
    /// unrepresentable even under misuse.
    fn update(&self, key: &TicketKey, f: impl FnOnce(&mut JobState)) {
        let Some(current) = self.cache.get(key) else {
            return;
        };
        if current.status.is_terminal() {
            return;
        }
        let mut next = (*current).clone();
        f(&mut next);
        self.cache.insert(*key, Arc::new(next));
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::{ReportFormat, ReportParams, ReportType};
    use uuid::Uuid;

    fn key() -> TicketKey {
        TicketKey::new(ReportType::TrialBalance, Uuid::new_v4())
    }

    fn seed(store: &JobStore, key: TicketKey, company_id: i64) {
        store.seed(
            key,
            JobState::queued(ReportFormat::Pdf, ReportParams::default(), company_id),
        );
    }

    #[test]
    fn test_seed_and_get() {
        let store = JobStore::new();
        let key = key();
        seed(&store, key, 7);

        let state = store.get(&key).unwrap();
        assert_eq!(state.status, JobStatus::Queued);
        assert_eq!(state.progress, 0);
        assert_eq!(state.company_id, 7);
        assert!(state.file.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_unknown_ticket_not_found() {
        let store = JobStore::new();
        assert_eq!(
            store.get_scoped(&key(), 7).unwrap_err(),
            JobAccessError::NotFound
        );
    }

    #[test]
    fn test_scoped_read_enforces_tenant() {
        let store = JobStore::new();
        let key = key();
        seed(&store, key, 7);

        assert!(store.get_scoped(&key, 7).is_ok());
        assert_eq!(
            store.get_scoped(&key, 99).unwrap_err(),
            JobAccessError::Forbidden
        );
    }

    #[test]
    fn test_same_ticket_different_report_type_is_distinct() {
        let store = JobStore::new();
        let ticket = Uuid::new_v4();
        let tb = TicketKey::new(ReportType::TrialBalance, ticket);
        let gl = TicketKey::new(ReportType::GeneralLedger, ticket);
        seed(&store, tb, 7);

        assert!(store.get(&tb).is_some());
        assert!(store.get(&gl).is_none());
    }

    #[test]
    fn test_lifecycle_to_done() {
        let store = JobStore::new();
        let key = key();
        seed(&store, key, 7);

        store.mark_running(&key);
        assert_eq!(store.get(&key).unwrap().status, JobStatus::Running);

        store.set_progress(&key, 40);
        assert_eq!(store.get(&key).unwrap().progress, 40);

        store.complete(&key, "tb/x/report.pdf".into(), "report.pdf".into());
        let state = store.get(&key).unwrap();
        assert_eq!(state.status, JobStatus::Done);
        assert_eq!(state.progress, 100);
        assert_eq!(state.file.as_deref(), Some("tb/x/report.pdf"));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_lifecycle_to_error_clears_file() {
        let store = JobStore::new();
        let key = key();
        seed(&store, key, 7);

        store.mark_running(&key);
        store.fail(&key, "query failed");
        let state = store.get(&key).unwrap();
        assert_eq!(state.status, JobStatus::Error);
        assert!(state.file.is_none());
        assert_eq!(state.error.as_deref(), Some("query failed"));
    }

    #[test]
    fn test_error_message_never_empty() {
        let store = JobStore::new();
        let key = key();
        seed(&store, key, 7);

        store.fail(&key, "");
        let state = store.get(&key).unwrap();
        assert_eq!(state.status, JobStatus::Error);
        assert!(!state.error.as_deref().unwrap_or("").is_empty());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let store = JobStore::new();
        let key = key();
        seed(&store, key, 7);
        store.mark_running(&key);

        store.set_progress(&key, 60);
        store.set_progress(&key, 30);
        assert_eq!(store.get(&key).unwrap().progress, 60);

        store.set_progress(&key, 250);
        assert_eq!(store.get(&key).unwrap().progress, 100);
    }

    #[test]
    fn test_no_transition_out_of_terminal() {
        let store = JobStore::new();
        let key = key();
        seed(&store, key, 7);

        store.complete(&key, "f".into(), "f.pdf".into());
        store.fail(&key, "late failure");
        let state = store.get(&key).unwrap();
        assert_eq!(state.status, JobStatus::Done);
        assert!(state.error.is_none());

        store.mark_running(&key);
        assert_eq!(store.get(&key).unwrap().status, JobStatus::Done);
    }

    #[test]
    fn test_ttl_eviction() {
        let store = JobStore::with_config(16, 1);
        let key = key();
        seed(&store, key, 7);
        assert!(store.get_scoped(&key, 7).is_ok());

        std::thread::sleep(std::time::Duration::from_millis(1_100));
        assert_eq!(
            store.get_scoped(&key, 7).unwrap_err(),
            JobAccessError::NotFound
        );
    }
}
