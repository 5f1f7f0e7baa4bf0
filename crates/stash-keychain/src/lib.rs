//! Stash Keychain
//!
//! Typed credential storage over an untyped secure byte store:
//! - Values are text, booleans or blobs; nothing else can be stored
//! - Keys are scoped by the application namespace (`<namespace>.<key>`)
//! - Every read and write goes to the backend; nothing is cached

mod backend;
mod error;
mod key;
mod store;
mod value;

pub use backend::{KeyringBackend, MemoryBackend, SecretBackend};
pub use error::KeychainError;
pub use key::{CredentialKey, Namespace};
pub use store::CredentialStore;
pub use value::{StoredValue, ValueEncoding};

pub type Result<T> = std::result::Result<T, KeychainError>;
