//! Namespaced credential keys

use std::fmt;

const FALLBACK_NAMESPACE: &str = "stash";

/// Application namespace that scopes every credential key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The running executable's file stem.
    pub fn current() -> Self {
        let name = std::env::current_exe()
            .ok()
            .and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_NAMESPACE.to_string());
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A symbolic credential key. Applications usually implement this on an
/// enum of their secrets.
pub trait CredentialKey {
    fn raw_key(&self) -> &str;

    /// `<namespace>.<raw_key>`
    fn unique_key(&self, namespace: &Namespace) -> String {
        format!("{}.{}", namespace.as_str(), self.raw_key())
    }
}

impl CredentialKey for str {
    fn raw_key(&self) -> &str {
        self
    }
}

impl CredentialKey for String {
    fn raw_key(&self) -> &str {
        self
    }
}
