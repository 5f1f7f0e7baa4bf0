//! Storage service container

use std::sync::Arc;

use stash_keychain::{CredentialStore, KeyringBackend, SecretBackend};
use stash_storage::DbManager;

use crate::config::Config;
use crate::Result;

/// Database manager and credential store built from one `Config`.
///
/// Construct once at the application's composition root and share it
/// (e.g. behind an `Arc`). Both services are `Send + Sync`.
pub struct DataStorage {
    /// Configuration
    config: Config,
    /// Database access manager
    db: DbManager,
    /// Credential store facade
    credentials: CredentialStore,
}

impl DataStorage {
    pub fn new(config: Config, backend: Arc<dyn SecretBackend>) -> Result<Self> {
        config.validate()?;

        let db = DbManager::new(config.path_resolver());
        let credentials = CredentialStore::new(
            backend,
            config.credential_namespace(),
            config.credential_encoding,
        );

        tracing::info!(
            namespace = %config.namespace,
            documents_dir = %config.documents_dir.display(),
            "Initialized data storage"
        );

        Ok(Self {
            config,
            db,
            credentials,
        })
    }

    /// Credentials go to the platform keychain under the config namespace.
    pub fn with_keyring(config: Config) -> Result<Self> {
        let backend = Arc::new(KeyringBackend::new(config.namespace.clone()));
        Self::new(config, backend)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db(&self) -> &DbManager {
        &self.db
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }
}
