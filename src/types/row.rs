use std::sync::Arc;

use crate::error::{DbRsError, Result};
use crate::types::{FromSqlValue, SqlValue};

/// Driver-agnostic materialized result, used to script responses for tests
/// and by drivers whose client library returns all rows at once.
#[derive(Debug, Clone, Default)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<SqlValue>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// The current row of a cursor.
/// Values are accessed by column name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a new Row from shared column names and values in column order.
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Position of a column. Exact match wins, then an ASCII
    /// case-insensitive match, since backends disagree on identifier case.
    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(column))
            })
    }

    /// Gets the raw value of a column by name.
    pub fn value(&self, column: &str) -> Result<&SqlValue> {
        self.index_of(column)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| DbRsError::ColumnNotFound(column.to_string()))
    }

    /// Gets a column value converted to `T`.
    /// Use `Option<T>` for nullable columns.
    pub fn get<T: FromSqlValue>(&self, column: &str) -> Result<T> {
        T::from_sql_value(column, self.value(column)?)
    }

    pub fn get_str(&self, column: &str) -> Result<String> {
        self.get(column)
    }

    pub fn get_i32(&self, column: &str) -> Result<i32> {
        self.get(column)
    }

    pub fn get_i64(&self, column: &str) -> Result<i64> {
        self.get(column)
    }

    pub fn get_f64(&self, column: &str) -> Result<f64> {
        self.get(column)
    }

    pub fn get_bool(&self, column: &str) -> Result<bool> {
        self.get(column)
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values of this row in column order.
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of a statement executed as an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteOutcome {
    /// Affected-row count as reported by the backend.
    pub rows_affected: u64,
    /// First generated key, when keys were requested and the backend produced one.
    pub generated_key: Option<i64>,
}

impl ExecuteOutcome {
    pub fn new(rows_affected: u64, generated_key: Option<i64>) -> Self {
        Self {
            rows_affected,
            generated_key,
        }
    }
}
