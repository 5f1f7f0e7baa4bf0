//! Database handle and table operations

use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::StorageError;
use crate::query::{quote_identifier, QueryOptions, ResultColumn};
use crate::record::{Record, RecordRow};
use crate::Result;

/// A live connection to one database file.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    tag: Option<i64>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;

        // Nothing here may read the file: with SQLCipher the key has to be
        // the first statement that touches it.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
            tag: None,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
            tag: None,
        })
    }

    pub fn with_tag(mut self, tag: i64) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn tag(&self) -> Option<i64> {
        self.tag
    }

    /// File backing this handle; `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` inside a transaction. An error from `f` rolls back.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Set the encryption key for this connection. `None` leaves the
    /// connection unkeyed. A key on a build without SQLCipher is an error
    /// rather than a silently plaintext file.
    pub fn set_cipher(&self, key: Option<&[u8]>) -> Result<()> {
        let Some(key) = key else {
            return Ok(());
        };

        let mut hex = String::with_capacity(key.len() * 2);
        for byte in key {
            let _ = write!(hex, "{byte:02x}");
        }

        self.with_connection(|conn| {
            // Plain SQLite treats unknown pragmas as no-ops returning no row.
            let version: Option<String> = conn
                .query_row("PRAGMA cipher_version", [], |row| row.get(0))
                .optional()?;
            if version.is_none() {
                return Err(StorageError::CipherUnsupported);
            }

            // SQLCipher answers with an "ok" row.
            let mut stmt = conn.prepare(&format!("PRAGMA key = \"x'{hex}'\""))?;
            let mut rows = stmt.query([])?;
            while rows.next()?.is_some() {}
            Ok(())
        })
    }

    pub fn create_table<R: Record>(&self, table: &str) -> Result<()> {
        self.with_connection(|conn| Executor::new(conn).create_table::<R>(table))
    }

    /// Insert every object in one transaction.
    pub fn insert<R: Record>(&self, objects: &[R], columns: Option<&[&str]>, table: &str) -> Result<()> {
        self.transaction(|conn| Executor::new(conn).insert(objects, columns, table))
    }

    pub fn insert_or_replace<R: Record>(
        &self,
        objects: &[R],
        columns: Option<&[&str]>,
        table: &str,
    ) -> Result<()> {
        self.transaction(|conn| Executor::new(conn).insert_or_replace(objects, columns, table))
    }

    pub fn delete(&self, table: &str, options: &QueryOptions) -> Result<usize> {
        self.with_connection(|conn| Executor::new(conn).delete(table, options))
    }

    pub fn update<R: Record>(
        &self,
        table: &str,
        columns: &[&str],
        object: &R,
        options: &QueryOptions,
    ) -> Result<usize> {
        self.with_connection(|conn| Executor::new(conn).update(table, columns, object, options))
    }

    pub fn get_objects<R: Record>(
        &self,
        columns: &[&str],
        table: &str,
        options: &QueryOptions,
    ) -> Result<Vec<R>> {
        self.with_connection(|conn| Executor::new(conn).get_objects(columns, table, options))
    }

    pub fn get_value(
        &self,
        column: &ResultColumn,
        table: &str,
        options: &QueryOptions,
    ) -> Result<Option<Value>> {
        self.with_connection(|conn| Executor::new(conn).get_value(column, table, options))
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.with_connection(|conn| Executor::new(conn).drop_table(table))
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        self.with_connection(|conn| Executor::new(conn).table_exists(table))
    }
}

/// Table operations bound to a borrowed connection or open transaction.
pub struct Executor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Executor<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }

    /// Create `table` for `R` unless it already exists.
    pub fn create_table<R: Record>(&self, table: &str) -> Result<()> {
        let definitions: Vec<String> = R::columns().iter().map(|c| c.definition()).collect();
        if definitions.is_empty() {
            return Err(StorageError::EmptyColumns(table.to_string()));
        }
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            quote_identifier(table),
            definitions.join(", ")
        ))?;
        Ok(())
    }

    pub fn insert<R: Record>(&self, objects: &[R], columns: Option<&[&str]>, table: &str) -> Result<()> {
        self.write_rows("INSERT", objects, columns, table)
    }

    pub fn insert_or_replace<R: Record>(
        &self,
        objects: &[R],
        columns: Option<&[&str]>,
        table: &str,
    ) -> Result<()> {
        self.write_rows("INSERT OR REPLACE", objects, columns, table)
    }

    fn write_rows<R: Record>(
        &self,
        verb: &str,
        objects: &[R],
        columns: Option<&[&str]>,
        table: &str,
    ) -> Result<()> {
        let indexes = match columns {
            Some(columns) if !columns.is_empty() => column_indexes::<R>(columns, table)?,
            _ => (0..R::columns().len()).collect(),
        };
        if indexes.is_empty() {
            return Err(StorageError::EmptyColumns(table.to_string()));
        }

        let names: Vec<String> = indexes
            .iter()
            .map(|&i| quote_identifier(R::columns()[i].name))
            .collect();
        let placeholders = vec!["?"; indexes.len()].join(", ");
        let sql = format!(
            "{verb} INTO {} ({}) VALUES ({placeholders})",
            quote_identifier(table),
            names.join(", ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        for object in objects {
            let values = object.to_values();
            stmt.execute(params_from_iter(indexes.iter().map(|&i| &values[i])))?;
        }
        Ok(())
    }

    /// Delete matching rows, or every row when no condition is set.
    pub fn delete(&self, table: &str, options: &QueryOptions) -> Result<usize> {
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            quote_identifier(table),
            options.mutation_clause(table, &mut params)
        );
        Ok(self.conn.execute(&sql, params_from_iter(params.iter()))?)
    }

    /// Copy `columns` of `object` onto matching rows. An empty column list
    /// means every declared column.
    pub fn update<R: Record>(
        &self,
        table: &str,
        columns: &[&str],
        object: &R,
        options: &QueryOptions,
    ) -> Result<usize> {
        let indexes = if columns.is_empty() {
            (0..R::columns().len()).collect()
        } else {
            column_indexes::<R>(columns, table)?
        };
        if indexes.is_empty() {
            return Err(StorageError::EmptyColumns(table.to_string()));
        }

        let values = object.to_values();
        let mut params: Vec<Value> = indexes.iter().map(|&i| values[i].clone()).collect();
        let assignments: Vec<String> = indexes
            .iter()
            .map(|&i| format!("{} = ?", quote_identifier(R::columns()[i].name)))
            .collect();

        let sql = format!(
            "UPDATE {} SET {}{}",
            quote_identifier(table),
            assignments.join(", "),
            options.mutation_clause(table, &mut params)
        );
        Ok(self.conn.execute(&sql, params_from_iter(params.iter()))?)
    }

    /// Select `columns` (every declared column when empty) into records.
    pub fn get_objects<R: Record>(
        &self,
        columns: &[&str],
        table: &str,
        options: &QueryOptions,
    ) -> Result<Vec<R>> {
        let names: Vec<&str> = if columns.is_empty() {
            R::column_names()
        } else {
            column_indexes::<R>(columns, table)?
                .into_iter()
                .map(|i| R::columns()[i].name)
                .collect()
        };

        let mut params = Vec::new();
        let quoted: Vec<String> = names.iter().map(|name| quote_identifier(name)).collect();
        let sql = format!(
            "SELECT {} FROM {}{}",
            quoted.join(", "),
            quote_identifier(table),
            options.select_clause(&mut params)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| RecordRow::read(row, &names))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.iter().map(R::from_row).collect()
    }

    /// First column of the first matching row.
    pub fn get_value(
        &self,
        column: &ResultColumn,
        table: &str,
        options: &QueryOptions,
    ) -> Result<Option<Value>> {
        let mut params = Vec::new();
        let sql = format!(
            "SELECT {} FROM {}{}",
            column.render(),
            quote_identifier(table),
            options.select_clause(&mut params)
        );

        let value = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get::<_, Value>(0))
            .optional()?;
        Ok(value)
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_identifier(table)))?;
        Ok(())
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn column_indexes<R: Record>(columns: &[&str], table: &str) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|name| {
            R::column_index(name).ok_or_else(|| StorageError::InvalidColumn {
                table: table.to_string(),
                column: (*name).to_string(),
            })
        })
        .collect()
}
