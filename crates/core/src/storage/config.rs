//! Storage configuration.

use std::path::PathBuf;

/// Storage backend configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// The configured provider.
    pub provider: StorageProvider,
}

impl StorageConfig {
    /// Creates a configuration for the given provider.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self { provider }
    }
}

/// Supported storage providers.
#[derive(Debug, Clone)]
pub enum StorageProvider {
    /// S3-compatible object storage.
    S3 {
        /// Endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key id.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Azure Blob Storage.
    AzureBlob {
        /// Storage account name.
        account: String,
        /// Access key.
        access_key: String,
        /// Container name.
        container: String,
    },
    /// Local filesystem (dev default).
    LocalFs {
        /// Root directory for artifacts.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Local filesystem provider rooted at `root`.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azblob",
            Self::LocalFs { .. } => "fs",
        }
    }
}
