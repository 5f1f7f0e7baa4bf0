//! Database access manager
//!
//! Single entry point for application code. Each call resolves the named
//! database, opens a fresh handle (creating the file if absent), performs one
//! action and drops the handle. No handle is cached between calls.
//!
//! Two flavours are offered:
//! - `try_*` methods surface the underlying error.
//! - The plain methods keep the legacy contract: errors are logged at `warn`
//!   and collapsed into `false` / `None` / nothing.

use parking_lot::RwLock;
use rusqlite::types::Value;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::database::{Database, Executor};
use crate::error::StorageError;
use crate::path::PathResolver;
use crate::query::{QueryOptions, ResultColumn};
use crate::record::Record;
use crate::Result;

pub struct DbManager {
    /// Resolves logical names to files
    resolver: PathResolver,
    /// Encryption keys applied to every handle opened for a database
    cipher_keys: RwLock<HashMap<String, Vec<u8>>>,
}

impl DbManager {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            cipher_keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn database_path(&self, name: &str) -> PathBuf {
        self.resolver.path(name)
    }

    /// Open (creating if absent) the database called `name`.
    pub fn create_database(&self, name: &str) -> Result<Database> {
        let path = self.resolver.ensure_parent(name)?;
        let db = Database::open(&path)?;
        let key = self.cipher_keys.read().get(name).cloned();
        db.set_cipher(key.as_deref())?;
        Ok(db)
    }

    pub fn try_insert<R: Record>(
        &self,
        objects: &[R],
        columns: Option<&[&str]>,
        database: &str,
    ) -> Result<()> {
        let db = self.create_database(database)?;
        db.create_table::<R>(R::table_name())?;
        db.insert(objects, columns, R::table_name())
    }

    pub fn try_insert_or_replace<R: Record>(
        &self,
        objects: &[R],
        columns: Option<&[&str]>,
        database: &str,
    ) -> Result<()> {
        let db = self.create_database(database)?;
        db.create_table::<R>(R::table_name())?;
        db.insert_or_replace(objects, columns, R::table_name())
    }

    /// Delete matching rows; without a condition every row goes but the
    /// table stays.
    pub fn try_delete(&self, database: &str, table: &str, options: &QueryOptions) -> Result<usize> {
        self.create_database(database)?.delete(table, options)
    }

    /// Update matching rows from `object`. Empty `columns` means all of
    /// `R`'s declared columns.
    pub fn try_update<R: Record>(
        &self,
        database: &str,
        table: &str,
        columns: &[&str],
        object: &R,
        options: &QueryOptions,
    ) -> Result<usize> {
        self.create_database(database)?
            .update(table, columns, object, options)
    }

    /// Select records. Empty `columns` means all of `R`'s declared columns.
    pub fn try_get<R: Record>(
        &self,
        database: &str,
        table: &str,
        columns: &[&str],
        options: &QueryOptions,
    ) -> Result<Vec<R>> {
        self.create_database(database)?
            .get_objects(columns, table, options)
    }

    pub fn try_get_value(
        &self,
        database: &str,
        table: &str,
        column: impl Into<ResultColumn>,
        options: &QueryOptions,
    ) -> Result<Option<Value>> {
        self.create_database(database)?
            .get_value(&column.into(), table, options)
    }

    /// Run `body` in a transaction; any error rolls it back.
    pub fn try_run<F, T>(&self, database: &str, body: F) -> Result<T>
    where
        F: FnOnce(&Executor<'_>) -> Result<T>,
    {
        self.create_database(database)?
            .transaction(|conn| body(&Executor::new(conn)))
    }

    pub fn try_delete_table(&self, database: &str, table: &str) -> Result<()> {
        self.create_database(database)?.drop_table(table)
    }

    /// Remove the database file.
    pub fn try_delete_database(&self, database: &str) -> Result<()> {
        let path = self.resolver.path(database);
        if !path.exists() {
            return Err(StorageError::DatabaseNotFound(path));
        }
        std::fs::remove_file(&path)?;

        tracing::info!(database = %database, path = %path.display(), "Deleted database");
        Ok(())
    }

    /// Set (or clear, with `None`) the key used for every later handle of
    /// `database`. The key is checked on a fresh handle first and only
    /// remembered if it applies.
    pub fn try_set_cipher(&self, database: &str, key: Option<&[u8]>) -> Result<()> {
        match key {
            Some(key) => {
                let path = self.resolver.ensure_parent(database)?;
                Database::open(&path)?.set_cipher(Some(key))?;
                self.cipher_keys.write().insert(database.to_string(), key.to_vec());
            }
            None => {
                self.cipher_keys.write().remove(database);
            }
        }
        Ok(())
    }

    pub fn insert<R: Record>(&self, objects: &[R], columns: Option<&[&str]>, database: &str) -> bool {
        report("insert", database, self.try_insert(objects, columns, database)).is_some()
    }

    pub fn insert_or_replace<R: Record>(
        &self,
        objects: &[R],
        columns: Option<&[&str]>,
        database: &str,
    ) -> bool {
        let result = self.try_insert_or_replace(objects, columns, database);
        report("insert_or_replace", database, result).is_some()
    }

    pub fn delete(&self, database: &str, table: &str, options: &QueryOptions) -> bool {
        report("delete", database, self.try_delete(database, table, options)).is_some()
    }

    pub fn update<R: Record>(
        &self,
        database: &str,
        table: &str,
        columns: &[&str],
        object: &R,
        options: &QueryOptions,
    ) -> bool {
        let result = self.try_update(database, table, columns, object, options);
        report("update", database, result).is_some()
    }

    /// `None` both when the query fails and when it cannot be decoded.
    pub fn get<R: Record>(
        &self,
        database: &str,
        table: &str,
        columns: &[&str],
        options: &QueryOptions,
    ) -> Option<Vec<R>> {
        report("get", database, self.try_get(database, table, columns, options))
    }

    /// `None` both for "no row" and for a failed query.
    pub fn get_value(
        &self,
        database: &str,
        table: &str,
        column: impl Into<ResultColumn>,
        options: &QueryOptions,
    ) -> Option<Value> {
        let result = self.try_get_value(database, table, column, options);
        report("get_value", database, result).flatten()
    }

    /// Errors from beginning, running or committing the transaction are
    /// logged and dropped.
    pub fn run<F>(&self, database: &str, body: F)
    where
        F: FnOnce(&Executor<'_>) -> Result<()>,
    {
        report("run", database, self.try_run(database, body));
    }

    pub fn delete_table(&self, database: &str, table: &str) -> bool {
        report("delete_table", database, self.try_delete_table(database, table)).is_some()
    }

    pub fn delete_database(&self, database: &str) -> bool {
        report("delete_database", database, self.try_delete_database(database)).is_some()
    }

    pub fn set_cipher(&self, database: &str, key: Option<&[u8]>) {
        report("set_cipher", database, self.try_set_cipher(database, key));
    }
}

fn report<T>(operation: &'static str, database: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(operation = operation, database = %database, error = %e, "Database operation failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Condition, OrderBy};
    use crate::record::{Column, ColumnType, RecordRow};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq)]
    struct Course {
        id: i64,
        title: String,
        hours: f64,
    }

    impl Course {
        fn new(id: i64, title: &str, hours: f64) -> Self {
            Self {
                id,
                title: title.to_string(),
                hours,
            }
        }
    }

    impl Record for Course {
        fn table_name() -> &'static str {
            "Course"
        }

        fn columns() -> &'static [Column] {
            const COLUMNS: &[Column] = &[
                Column::new("id", ColumnType::Integer).primary_key(),
                Column::new("title", ColumnType::Text),
                Column::new("hours", ColumnType::Real),
            ];
            COLUMNS
        }

        fn to_values(&self) -> Vec<Value> {
            vec![
                Value::Integer(self.id),
                Value::Text(self.title.clone()),
                Value::Real(self.hours),
            ]
        }

        fn from_row(row: &RecordRow) -> Result<Self> {
            Ok(Self {
                id: row.get_or_default("id")?,
                title: row.get_or_default("title")?,
                hours: row.get_or_default("hours")?,
            })
        }
    }

    fn manager() -> (TempDir, DbManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = DbManager::new(PathResolver::new(dir.path(), "StashTests"));
        (dir, manager)
    }

    fn all_courses(manager: &DbManager) -> Option<Vec<Course>> {
        manager.get("Study", "Course", &[], &QueryOptions::new().order_by(OrderBy::asc("id")))
    }

    #[test]
    fn test_insert_then_get() {
        let (_dir, manager) = manager();
        let courses = vec![Course::new(1, "Rust", 12.5), Course::new(2, "SQL", 3.0)];

        assert!(manager.insert(&courses, None, "Study"));
        assert_eq!(all_courses(&manager), Some(courses));
        assert!(manager.database_path("Study").exists());
    }

    #[test]
    fn test_insert_conflict_vs_insert_or_replace() {
        let (_dir, manager) = manager();
        assert!(manager.insert(&[Course::new(1, "Rust", 1.0)], None, "Study"));

        assert!(!manager.insert(&[Course::new(1, "Go", 2.0)], None, "Study"));
        assert_eq!(all_courses(&manager), Some(vec![Course::new(1, "Rust", 1.0)]));

        assert!(manager.insert_or_replace(&[Course::new(1, "Go", 2.0)], None, "Study"));
        assert_eq!(all_courses(&manager), Some(vec![Course::new(1, "Go", 2.0)]));
    }

    #[test]
    fn test_delete_keeps_table_but_delete_table_drops_it() {
        let (_dir, manager) = manager();
        manager.insert(&[Course::new(1, "Rust", 1.0)], None, "Study");

        assert!(manager.delete("Study", "Course", &QueryOptions::new()));
        assert_eq!(all_courses(&manager), Some(vec![]));

        assert!(manager.delete_table("Study", "Course"));
        assert_eq!(all_courses(&manager), None);
        assert!(manager
            .try_get::<Course>("Study", "Course", &[], &QueryOptions::new())
            .is_err());
    }

    #[test]
    fn test_update_defaults_to_all_columns() {
        let (_dir, manager) = manager();
        manager.insert(
            &[Course::new(1, "Rust", 1.0), Course::new(2, "SQL", 2.0)],
            None,
            "Study",
        );

        let only_two = QueryOptions::new().filter(Condition::eq("id", 2i64));
        assert!(manager.update("Study", "Course", &[], &Course::new(2, "Postgres", 9.0), &only_two));
        assert!(manager.update("Study", "Course", &["hours"], &Course::new(0, "x", 4.0), &only_two));

        assert_eq!(
            all_courses(&manager),
            Some(vec![Course::new(1, "Rust", 1.0), Course::new(2, "Postgres", 4.0)])
        );
    }

    #[test]
    fn test_get_value_and_partial_get() {
        let (_dir, manager) = manager();
        manager.insert(
            &[Course::new(1, "Rust", 1.0), Course::new(2, "SQL", 2.0)],
            None,
            "Study",
        );

        let title = manager.get_value(
            "Study",
            "Course",
            "title",
            &QueryOptions::new().order_by(OrderBy::desc("id")),
        );
        assert_eq!(title, Some(Value::Text("SQL".to_string())));
        assert_eq!(manager.get_value("Study", "Missing", "title", &QueryOptions::new()), None);

        let titles: Vec<Course> = manager
            .try_get("Study", "Course", &["title"], &QueryOptions::new().limit(1).offset(1))
            .unwrap();
        assert_eq!(titles, vec![Course::new(0, "SQL", 0.0)]);
    }

    #[test]
    fn test_run_commits_and_rolls_back() {
        let (_dir, manager) = manager();
        manager.insert(&[Course::new(1, "Rust", 1.0)], None, "Study");

        manager.run("Study", |tx| {
            tx.insert(&[Course::new(2, "SQL", 2.0)], None, "Course")
        });
        manager.run("Study", |tx| {
            tx.delete("Course", &QueryOptions::new())?;
            tx.insert(&[Course::new(1, "Rust", 1.0), Course::new(1, "Rust", 1.0)], None, "Course")
        });

        assert_eq!(
            all_courses(&manager),
            Some(vec![Course::new(1, "Rust", 1.0), Course::new(2, "SQL", 2.0)])
        );

        let count = manager
            .try_run("Study", |tx| {
                tx.get_value(&ResultColumn::Count, "Course", &QueryOptions::new())
            })
            .unwrap();
        assert_eq!(count, Some(Value::Integer(2)));
    }

    #[test]
    fn test_delete_database_then_recreate() {
        let (_dir, manager) = manager();
        manager.insert(&[Course::new(1, "Rust", 1.0)], None, "Study");

        assert!(manager.delete_database("Study"));
        assert!(!manager.database_path("Study").exists());
        assert!(!manager.delete_database("Study"));
        assert!(matches!(
            manager.try_delete_database("Study"),
            Err(StorageError::DatabaseNotFound(_))
        ));

        assert_eq!(manager.get_value("Study", "Course", ResultColumn::Count, &QueryOptions::new()), None);
        assert!(manager.database_path("Study").exists());
        assert!(manager.insert(&[Course::new(5, "New", 1.0)], None, "Study"));
        assert_eq!(all_courses(&manager), Some(vec![Course::new(5, "New", 1.0)]));
    }

    #[test]
    fn test_get_filters_on_text() {
        let (_dir, manager) = manager();
        manager.insert(
            &[Course::new(1, "Rust", 1.0), Course::new(2, "SQL", 2.0)],
            None,
            "Study",
        );

        let sql: Vec<Course> = manager
            .try_get("Study", "Course", &[], &QueryOptions::new().filter(Condition::eq("title", "SQL")))
            .unwrap();
        assert_eq!(sql, vec![Course::new(2, "SQL", 2.0)]);
    }

    #[cfg(not(feature = "sqlcipher"))]
    #[test]
    fn test_set_cipher_without_sqlcipher_fails() {
        let (_dir, manager) = manager();
        assert!(matches!(
            manager.try_set_cipher("Vault", Some(b"secret")),
            Err(StorageError::CipherUnsupported)
        ));
        assert!(!manager.cipher_keys.read().contains_key("Vault"));

        manager.set_cipher("Vault", Some(b"secret"));
        assert!(manager.insert(&[Course::new(1, "Rust", 1.0)], None, "Vault"));
        manager.try_set_cipher("Vault", None).unwrap();
    }

    #[cfg(feature = "sqlcipher")]
    #[test]
    fn test_set_cipher_applies_to_later_handles() {
        let (dir, manager) = manager();
        manager.try_set_cipher("Vault", Some(b"secret")).unwrap();
        assert!(manager.insert(&[Course::new(1, "Rust", 1.0)], None, "Vault"));

        let header = std::fs::read(manager.database_path("Vault")).unwrap();
        assert!(!header.starts_with(b"SQLite format 3"));

        let keyless = DbManager::new(PathResolver::new(dir.path(), "StashTests"));
        assert_eq!(
            keyless.get::<Course>("Vault", "Course", &[], &QueryOptions::new()),
            None
        );

        assert_eq!(
            manager.get("Vault", "Course", &[], &QueryOptions::new()),
            Some(vec![Course::new(1, "Rust", 1.0)])
        );

        manager.set_cipher("Vault", None);
        assert!(!manager.cipher_keys.read().contains_key("Vault"));
    }
}
