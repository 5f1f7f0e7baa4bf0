//! Credential store facade

use std::any::Any;
use std::sync::Arc;

use crate::backend::SecretBackend;
use crate::key::{CredentialKey, Namespace};
use crate::value::{StoredValue, ValueEncoding};
use crate::Result;

/// Typed credential access over a `SecretBackend`.
///
/// Every call goes straight to the backend. Concurrent writers to the same
/// key get whatever atomicity the backend offers.
pub struct CredentialStore {
    backend: Arc<dyn SecretBackend>,
    namespace: Namespace,
    encoding: ValueEncoding,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn SecretBackend>, namespace: Namespace, encoding: ValueEncoding) -> Self {
        Self {
            backend,
            namespace,
            encoding,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn encoding(&self) -> ValueEncoding {
        self.encoding
    }

    pub fn set<K>(&self, key: &K, value: impl Into<StoredValue>) -> Result<()>
    where
        K: CredentialKey + ?Sized,
    {
        let value = value.into();
        let unique_key = key.unique_key(&self.namespace);
        self.backend.set(&unique_key, &self.encoding.encode(&value))?;

        tracing::debug!(key = %unique_key, "Stored credential");
        Ok(())
    }

    pub fn get<K>(&self, key: &K) -> Result<Option<StoredValue>>
    where
        K: CredentialKey + ?Sized,
    {
        let unique_key = key.unique_key(&self.namespace);
        Ok(self
            .backend
            .get(&unique_key)?
            .and_then(|bytes| self.encoding.decode(bytes)))
    }

    pub fn remove<K>(&self, key: &K) -> Result<bool>
    where
        K: CredentialKey + ?Sized,
    {
        self.backend.remove(&key.unique_key(&self.namespace))
    }

    /// Store a dynamically typed value.
    ///
    /// # Panics
    /// When `value` is not a `String`, `&'static str`, `bool` or `Vec<u8>`.
    /// Passing any other kind is a programming error.
    pub fn set_any<K>(&self, key: &K, value: &dyn Any) -> Result<()>
    where
        K: CredentialKey + ?Sized,
    {
        let value = if let Some(text) = value.downcast_ref::<String>() {
            StoredValue::Text(text.clone())
        } else if let Some(text) = value.downcast_ref::<&'static str>() {
            StoredValue::Text((*text).to_string())
        } else if let Some(flag) = value.downcast_ref::<bool>() {
            StoredValue::Bool(*flag)
        } else if let Some(bytes) = value.downcast_ref::<Vec<u8>>() {
            StoredValue::Blob(bytes.clone())
        } else {
            panic!("unsupported credential value kind: only String/bool/Vec<u8> can be stored");
        };
        self.set(key, value)
    }

    /// `get` with backend errors logged and dropped.
    pub fn value<K>(&self, key: &K) -> Option<StoredValue>
    where
        K: CredentialKey + ?Sized,
    {
        match self.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key.raw_key(), error = %e, "Failed to read credential");
                None
            }
        }
    }

    /// `set` with backend errors logged and collapsed into `false`.
    pub fn set_value<K>(&self, key: &K, value: impl Into<StoredValue>) -> bool
    where
        K: CredentialKey + ?Sized,
    {
        match self.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key.raw_key(), error = %e, "Failed to store credential");
                false
            }
        }
    }
}
