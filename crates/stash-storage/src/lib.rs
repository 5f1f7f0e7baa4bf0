//! Stash Storage Layer
//!
//! Thin access layer over SQLite. Every manager call opens a fresh handle for
//! the named database, performs one action and releases it; durability,
//! locking and encryption are SQLite's (or SQLCipher's) business.

mod database;
mod error;
mod manager;
mod path;
mod query;
mod record;
mod registry;

pub use database::{Database, Executor};
pub use error::StorageError;
pub use manager::DbManager;
pub use path::PathResolver;
pub use query::{Condition, IntoSqlValue, Order, OrderBy, QueryOptions, ResultColumn};
pub use record::{Column, ColumnType, Record, RecordRow};
pub use registry::{LogicalDatabase, LogicalTable, SampleDatabase, SampleTable, TAG_BASE};

pub use rusqlite::types::Value;

pub type Result<T> = std::result::Result<T, StorageError>;
