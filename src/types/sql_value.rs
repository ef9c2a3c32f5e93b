use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{DbRsError, Result};

/// Represents a SQL value in a driver-agnostic way.
/// Used both for statement arguments and for decoded column values.
/// Drivers are responsible for converting these to and from their native types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Short name of the value kind, used in error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Text(_) => "text",
            SqlValue::Int32(_) => "int32",
            SqlValue::Int64(_) => "int64",
            SqlValue::Double(_) => "double",
            SqlValue::Bool(_) => "bool",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Bytes(_) => "bytes",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int32(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int64(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Double(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Conversion from a decoded column value into a Rust type.
///
/// Numeric conversions are checked: a value that does not fit the target
/// type is a mismatch, never a truncation. Text holding a number is parsed,
/// the way most SQL drivers allow reading `'30'` as an integer.
pub trait FromSqlValue: Sized {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self>;
}

fn mismatch(column: &str, expected: &'static str, value: &SqlValue) -> DbRsError {
    DbRsError::ColumnTypeMismatch {
        column: column.to_string(),
        expected,
        found: value.kind(),
    }
}

impl FromSqlValue for String {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            SqlValue::Int32(i) => Ok(i.to_string()),
            SqlValue::Int64(i) => Ok(i.to_string()),
            SqlValue::Double(d) => Ok(d.to_string()),
            SqlValue::Bool(b) => Ok(b.to_string()),
            SqlValue::Timestamp(ts) => Ok(ts.to_string()),
            other => Err(mismatch(column, "text", other)),
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Int32(i) => Ok(i64::from(*i)),
            SqlValue::Int64(i) => Ok(*i),
            SqlValue::Bool(b) => Ok(i64::from(*b)),
            SqlValue::Text(s) => s.trim().parse().map_err(|_| mismatch(column, "int64", value)),
            other => Err(mismatch(column, "int64", other)),
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self> {
        let wide =
            i64::from_sql_value(column, value).map_err(|_| mismatch(column, "int32", value))?;
        i32::try_from(wide).map_err(|_| mismatch(column, "int32", value))
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Double(d) => Ok(*d),
            SqlValue::Int32(i) => Ok(f64::from(*i)),
            // i64 -> f64 may round above 2^53, same as a SQL driver reading BIGINT as DOUBLE
            SqlValue::Int64(i) => Ok(*i as f64),
            SqlValue::Text(s) => s.trim().parse().map_err(|_| mismatch(column, "double", value)),
            other => Err(mismatch(column, "double", other)),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int32(i) => Ok(*i != 0),
            SqlValue::Int64(i) => Ok(*i != 0),
            other => Err(mismatch(column, "bool", other)),
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Timestamp(ts) => Ok(*ts),
            // SQLite and text protocols hand timestamps over as strings
            SqlValue::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .or_else(|_| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .map(|d| d.and_time(chrono::NaiveTime::MIN))
                })
                .map_err(|_| mismatch(column, "timestamp", value)),
            other => Err(mismatch(column, "timestamp", other)),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bytes(b) => Ok(b.clone()),
            SqlValue::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch(column, "bytes", other)),
        }
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(_column: &str, value: &SqlValue) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(column, other).map(Some),
        }
    }
}
