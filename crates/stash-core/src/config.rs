//! Storage configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use stash_keychain::{Namespace, ValueEncoding};
use stash_storage::PathResolver;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root under which `<namespace>/<name>.db` files are created
    pub documents_dir: PathBuf,
    /// Application namespace for database directories and credential keys
    pub namespace: String,
    /// Layout of credential values in the keychain
    pub credential_encoding: ValueEncoding,
}

impl Config {
    pub fn new(documents_dir: PathBuf, namespace: impl Into<String>) -> Self {
        Self {
            documents_dir,
            namespace: namespace.into(),
            credential_encoding: ValueEncoding::default(),
        }
    }

    pub fn documents_dir() -> PathBuf {
        dirs::document_dir().unwrap_or_else(|| PathBuf::from("Documents"))
    }

    /// Read a JSON config; absent fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(CoreError::Config("namespace cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn path_resolver(&self) -> PathResolver {
        PathResolver::new(self.documents_dir.clone(), self.namespace.clone())
    }

    pub fn credential_namespace(&self) -> Namespace {
        Namespace::new(self.namespace.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::documents_dir(), Namespace::current().as_str())
    }
}

// Platform documents directory lookup
mod dirs {
    use std::path::PathBuf;

    pub fn document_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|h| PathBuf::from(h).join("Documents"))
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Documents"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DOCUMENTS_DIR")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join("Documents"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
