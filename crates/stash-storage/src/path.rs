//! Database file locations
//!
//! Every logical database lives at `<documents>/<namespace>/<name>.db`.

use std::path::PathBuf;

use crate::Result;

const DATABASE_EXTENSION: &str = "db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    documents_dir: PathBuf,
    namespace: String,
}

impl PathResolver {
    pub fn new(documents_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            namespace: namespace.into(),
        }
    }

    pub fn documents_dir(&self) -> &PathBuf {
        &self.documents_dir
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Directory holding every database of this namespace.
    pub fn directory(&self) -> PathBuf {
        self.documents_dir.join(&self.namespace)
    }

    /// File path for `name`. The name is not sanitised.
    pub fn path(&self, name: &str) -> PathBuf {
        self.directory().join(format!("{name}.{DATABASE_EXTENSION}"))
    }

    /// Like `path`, creating the namespace directory first.
    pub fn ensure_parent(&self, name: &str) -> Result<PathBuf> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}
