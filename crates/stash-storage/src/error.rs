//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database file not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("Unknown column `{column}` for table `{table}`")]
    InvalidColumn { table: String, column: String },

    #[error("No columns to write for table `{0}`")]
    EmptyColumns(String),

    #[error("Encryption requested but SQLite was built without SQLCipher")]
    CipherUnsupported,

    #[error("Failed to decode row: {0}")]
    Decode(String),
}
