//! Artifact storage errors.

use thiserror::Error;

/// Failures while persisting or retrieving report artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The artifact is gone from the backing store (TTL/cleanup race).
    #[error("report artifact missing from storage: {key}")]
    NotFound {
        /// Storage key of the missing artifact.
        key: String,
    },

    /// The backend could not be initialized.
    #[error("storage backend misconfigured: {0}")]
    Configuration(String),

    /// The backend rejected or failed the operation.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    /// Configuration failure with a message.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Backend(err.to_string()),
        }
    }
}
