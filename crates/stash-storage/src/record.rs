//! Record schema declarations
//!
//! A `Record` declares its columns once; the manager derives table creation,
//! inserts, updates and selects from that declaration.

use rusqlite::types::{FromSql, Value, ValueRef};
use std::collections::HashMap;

use crate::error::StorageError;
use crate::query::quote_identifier;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }
}

/// A declared column of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
    pub primary_key: bool,
    pub not_null: bool,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnType) -> Self {
        Self {
            name,
            kind,
            primary_key: false,
            not_null: false,
        }
    }

    pub const fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            ..self
        }
    }

    pub const fn not_null(self) -> Self {
        Self {
            not_null: true,
            ..self
        }
    }

    pub(crate) fn definition(&self) -> String {
        let mut def = format!("{} {}", quote_identifier(self.name), self.kind.sql());
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        def
    }
}

/// A type that maps onto one table row.
///
/// `to_values` must yield one value per entry of `columns`, in the same order.
pub trait Record: Sized {
    /// Table used when inserting; conventionally the type name.
    fn table_name() -> &'static str;

    fn columns() -> &'static [Column];

    fn to_values(&self) -> Vec<Value>;

    /// Build a record from a row holding only the selected columns.
    fn from_row(row: &RecordRow) -> Result<Self>;

    fn column_names() -> Vec<&'static str> {
        Self::columns().iter().map(|column| column.name).collect()
    }

    fn column_index(name: &str) -> Option<usize> {
        Self::columns().iter().position(|column| column.name == name)
    }
}

/// One selected row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordRow {
    values: HashMap<String, Value>,
}

impl RecordRow {
    pub(crate) fn read(row: &rusqlite::Row<'_>, columns: &[&str]) -> rusqlite::Result<Self> {
        let mut values = HashMap::with_capacity(columns.len());
        for (index, name) in columns.iter().enumerate() {
            values.insert((*name).to_string(), row.get::<_, Value>(index)?);
        }
        Ok(Self { values })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Decode a column; a column that was not selected reads as NULL.
    pub fn get<T: FromSql>(&self, column: &str) -> Result<T> {
        let raw = self
            .values
            .get(column)
            .map(ValueRef::from)
            .unwrap_or(ValueRef::Null);
        T::column_result(raw).map_err(|e| StorageError::Decode(format!("column `{column}`: {e}")))
    }

    /// Like `get`, but NULL and unselected columns yield `T::default()`.
    pub fn get_or_default<T: FromSql + Default>(&self, column: &str) -> Result<T> {
        match self.values.get(column) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(_) => self.get(column),
        }
    }
}

impl From<HashMap<String, Value>> for RecordRow {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}
