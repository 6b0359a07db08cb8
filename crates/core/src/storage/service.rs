//! Artifact store implementation using Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use crate::jobs::ReportType;

/// Durable store for finished report artifacts.
///
/// Keys are scoped by report type and ticket so concurrent builds never
/// collide: `{report-type}/{ticket}/{filename}`.
#[derive(Clone)]
pub struct ArtifactStore {
    operator: Operator,
}

impl ArtifactStore {
    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        tracing::debug!(provider = config.provider.name(), "artifact store ready");
        Ok(Self { operator })
    }

    /// Create a local-filesystem store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be initialized.
    pub fn local(root: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        Self::from_config(&StorageConfig::new(StorageProvider::local_fs(root)))
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
        };

        Ok(operator)
    }

    /// Storage key for one ticket's artifact.
    #[must_use]
    pub fn artifact_key(report_type: ReportType, ticket: Uuid, filename: &str) -> String {
        format!("{}/{ticket}/{filename}", report_type.slug())
    }

    /// Writes an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.operator
            .write(key, bytes)
            .await
            .map(|_| ())
            .map_err(StorageError::from)
    }

    /// Reads an artifact's bytes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the artifact is missing (TTL/cleanup race)
    /// and `Backend` on other failures.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self.operator.read(key).await.map_err(StorageError::from)?;
        Ok(buffer.to_vec())
    }

    /// Checks whether an artifact exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Deletes an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (ArtifactStore, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("canebooks-artifacts-{}", Uuid::new_v4()));
        let store = ArtifactStore::local(&root).expect("local store");
        (store, root)
    }

    #[test]
    fn test_artifact_key_scoped_by_type_and_ticket() {
        let ticket = Uuid::new_v4();
        let key = ArtifactStore::artifact_key(ReportType::TrialBalance, ticket, "report.pdf");
        assert_eq!(key, format!("trial-balance/{ticket}/report.pdf"));
    }

    #[test]
    fn test_distinct_tickets_never_collide() {
        let a = ArtifactStore::artifact_key(ReportType::GeneralLedger, Uuid::new_v4(), "r.pdf");
        let b = ArtifactStore::artifact_key(ReportType::GeneralLedger, Uuid::new_v4(), "r.pdf");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let (store, root) = temp_store();
        let key = ArtifactStore::artifact_key(ReportType::CheckRegister, Uuid::new_v4(), "r.pdf");

        store.write(&key, b"%PDF-1.3 test".to_vec()).await.unwrap();
        assert!(store.exists(&key).await);

        let bytes = store.read(&key).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.3 test");

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (store, root) = temp_store();
        let err = store.read("trial-balance/none/r.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(!store.exists("trial-balance/none/r.pdf").await);
        let _ = std::fs::remove_dir_all(root);
    }
}
