//! Stash Core
//!
//! Composition root for the storage facade: one `Config`, one database
//! manager and one credential store, built explicitly and shared by the
//! application instead of living in process-wide singletons.

mod config;
mod data_storage;
mod error;

pub use config::Config;
pub use data_storage::DataStorage;
pub use error::CoreError;

// Re-export the facade components
pub use stash_keychain::{
    CredentialKey, CredentialStore, KeychainError, KeyringBackend, MemoryBackend, Namespace,
    SecretBackend, StoredValue, ValueEncoding,
};
pub use stash_storage::{
    Column, ColumnType, Condition, Database, DbManager, Executor, IntoSqlValue, LogicalDatabase,
    LogicalTable, Order, OrderBy, PathResolver, QueryOptions, Record, RecordRow, ResultColumn,
    SampleDatabase, SampleTable, StorageError, Value,
};
pub use stash_storage::Result as StorageResult;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// Reads `RUST_LOG`, defaulting to `info`. Safe to call more than once.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
