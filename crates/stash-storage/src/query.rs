//! Query shaping: conditions, ordering, limit and offset
//!
//! Values are always bound as parameters and identifiers always quoted; the
//! shape itself is handed to SQLite unmodified.

use rusqlite::types::Value;

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Anything a condition can compare a column against.
pub trait IntoSqlValue {
    fn into_sql_value(self) -> Value;
}

macro_rules! into_sql_value_via_from {
    ($($ty:ty),*) => {
        $(
            impl IntoSqlValue for $ty {
                fn into_sql_value(self) -> Value {
                    Value::from(self)
                }
            }
        )*
    };
}

into_sql_value_via_from!(Value, bool, i8, i16, i32, i64, u8, u16, u32, f64, String, Vec<u8>);

impl IntoSqlValue for &str {
    fn into_sql_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoSqlValue for &String {
    fn into_sql_value(self) -> Value {
        Value::Text(self.clone())
    }
}

impl IntoSqlValue for &[u8] {
    fn into_sql_value(self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl<T: IntoSqlValue> IntoSqlValue for Option<T> {
    fn into_sql_value(self) -> Value {
        self.map_or(Value::Null, IntoSqlValue::into_sql_value)
    }
}

/// A row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Ge(String, Value),
    Lt(String, Value),
    Le(String, Value),
    Like(String, String),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl IntoSqlValue) -> Self {
        Condition::Eq(column.into(), value.into_sql_value())
    }

    pub fn ne(column: impl Into<String>, value: impl IntoSqlValue) -> Self {
        Condition::Ne(column.into(), value.into_sql_value())
    }

    pub fn gt(column: impl Into<String>, value: impl IntoSqlValue) -> Self {
        Condition::Gt(column.into(), value.into_sql_value())
    }

    pub fn ge(column: impl Into<String>, value: impl IntoSqlValue) -> Self {
        Condition::Ge(column.into(), value.into_sql_value())
    }

    pub fn lt(column: impl Into<String>, value: impl IntoSqlValue) -> Self {
        Condition::Lt(column.into(), value.into_sql_value())
    }

    pub fn le(column: impl Into<String>, value: impl IntoSqlValue) -> Self {
        Condition::Le(column.into(), value.into_sql_value())
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::Like(column.into(), pattern.into())
    }

    pub fn is_in<V: IntoSqlValue>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Condition::In(column.into(), values.into_iter().map(IntoSqlValue::into_sql_value).collect())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull(column.into())
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Condition::NotNull(column.into())
    }

    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::And(mut parts) => {
                parts.push(other);
                Condition::And(parts)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Condition) -> Self {
        match self {
            Condition::Or(mut parts) => {
                parts.push(other);
                Condition::Or(parts)
            }
            first => Condition::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// Render as a SQL fragment, appending bound values to `params`.
    pub(crate) fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            Condition::Eq(column, value) => binary(column, "=", value, params),
            Condition::Ne(column, value) => binary(column, "<>", value, params),
            Condition::Gt(column, value) => binary(column, ">", value, params),
            Condition::Ge(column, value) => binary(column, ">=", value, params),
            Condition::Lt(column, value) => binary(column, "<", value, params),
            Condition::Le(column, value) => binary(column, "<=", value, params),
            Condition::Like(column, pattern) => {
                params.push(Value::Text(pattern.clone()));
                format!("{} LIKE ?", quote_identifier(column))
            }
            Condition::In(column, values) => {
                if values.is_empty() {
                    return "0 = 1".to_string();
                }
                params.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                format!("{} IN ({placeholders})", quote_identifier(column))
            }
            Condition::IsNull(column) => format!("{} IS NULL", quote_identifier(column)),
            Condition::NotNull(column) => format!("{} IS NOT NULL", quote_identifier(column)),
            Condition::And(parts) => join(parts, " AND ", "1 = 1", params),
            Condition::Or(parts) => join(parts, " OR ", "0 = 1", params),
            Condition::Not(inner) => format!("NOT ({})", inner.render(params)),
        }
    }
}

fn binary(column: &str, op: &str, value: &Value, params: &mut Vec<Value>) -> String {
    params.push(value.clone());
    format!("{} {op} ?", quote_identifier(column))
}

fn join(parts: &[Condition], separator: &str, empty: &str, params: &mut Vec<Value>) -> String {
    if parts.is_empty() {
        return empty.to_string();
    }
    let rendered: Vec<String> = parts
        .iter()
        .map(|part| format!("({})", part.render(params)))
        .collect();
    rendered.join(separator)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub order: Order,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: Order::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: Order::Desc,
        }
    }

    fn render(&self) -> String {
        let direction = match self.order {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        };
        format!("{} {direction}", quote_identifier(&self.column))
    }
}

/// Condition, ordering, limit and offset for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub condition: Option<Condition>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    fn is_shaped(&self) -> bool {
        !self.order_by.is_empty() || self.limit.is_some() || self.offset.is_some()
    }

    fn where_clause(&self, params: &mut Vec<Value>) -> String {
        match &self.condition {
            Some(condition) => format!(" WHERE {}", condition.render(params)),
            None => String::new(),
        }
    }

    fn tail_clause(&self) -> String {
        let mut sql = String::new();
        if !self.order_by.is_empty() {
            let columns: Vec<String> = self.order_by.iter().map(OrderBy::render).collect();
            sql.push_str(&format!(" ORDER BY {}", columns.join(", ")));
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }
        sql
    }

    /// Clause following `SELECT ... FROM table`.
    pub(crate) fn select_clause(&self, params: &mut Vec<Value>) -> String {
        let mut sql = self.where_clause(params);
        sql.push_str(&self.tail_clause());
        sql
    }

    /// Clause following `DELETE FROM table` or `UPDATE table SET ...`.
    ///
    /// Stock SQLite rejects ORDER BY/LIMIT on DELETE and UPDATE, so a shaped
    /// query targets rows through a rowid subselect instead.
    pub(crate) fn mutation_clause(&self, table: &str, params: &mut Vec<Value>) -> String {
        if !self.is_shaped() {
            return self.where_clause(params);
        }
        format!(
            " WHERE rowid IN (SELECT rowid FROM {}{})",
            quote_identifier(table),
            self.select_clause(params)
        )
    }
}

/// The single column or aggregate read by `get_value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultColumn {
    Column(String),
    Count,
    Max(String),
    Min(String),
    Sum(String),
    Avg(String),
}

impl ResultColumn {
    pub(crate) fn render(&self) -> String {
        match self {
            ResultColumn::Column(name) => quote_identifier(name),
            ResultColumn::Count => "COUNT(*)".to_string(),
            ResultColumn::Max(name) => format!("MAX({})", quote_identifier(name)),
            ResultColumn::Min(name) => format!("MIN({})", quote_identifier(name)),
            ResultColumn::Sum(name) => format!("SUM({})", quote_identifier(name)),
            ResultColumn::Avg(name) => format!("AVG({})", quote_identifier(name)),
        }
    }
}

impl From<&str> for ResultColumn {
    fn from(name: &str) -> Self {
        ResultColumn::Column(name.to_string())
    }
}

impl From<String> for ResultColumn {
    fn from(name: String) -> Self {
        ResultColumn::Column(name)
    }
}
