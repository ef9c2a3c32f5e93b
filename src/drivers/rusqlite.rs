use std::sync::Arc;

use rusqlite::types::{Value, ValueRef};

use super::ParamSlots;
use crate::error::{DbRsError, Result};
use crate::traits::{Connection, Cursor, Driver, GeneratedKeys, Statement};
use crate::types::{ExecuteOutcome, Row, SqlValue};

/// SQLite driver implementation using rusqlite.
///
/// Accepts `sqlite://<path>`, `sqlite:<path>` or a bare path; `:memory:`
/// opens a private in-memory database that lives as long as the connection.
#[derive(Debug, Default)]
pub struct RusqliteDriver;

impl RusqliteDriver {
    pub fn new() -> Self {
        Self
    }
}

fn database_path(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

fn execution_failed(e: rusqlite::Error) -> DbRsError {
    DbRsError::ExecutionFailed(e.to_string())
}

impl Driver for RusqliteDriver {
    fn connect(&self, url: &str) -> Result<Box<dyn Connection>> {
        let conn = rusqlite::Connection::open(database_path(url))
            .map_err(|e| DbRsError::ConnectionFailed(e.to_string()))?;
        Ok(Box::new(SqliteConnection { conn }))
    }
}

struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl Connection for SqliteConnection {
    fn prepare_statement(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<Box<dyn Statement + '_>> {
        let stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbRsError::StatementPreparationFailed(e.to_string()))?;
        let slots = ParamSlots::new(stmt.parameter_count());
        Ok(Box::new(SqliteStatement {
            conn: &self.conn,
            stmt,
            slots,
            keys,
        }))
    }
}

struct SqliteStatement<'c> {
    conn: &'c rusqlite::Connection,
    stmt: rusqlite::Statement<'c>,
    slots: ParamSlots,
    keys: GeneratedKeys,
}

impl SqliteStatement<'_> {
    fn bind_slots(&mut self) -> Result<()> {
        for (i, value) in self.slots.values()?.iter().enumerate() {
            self.stmt
                .raw_bind_parameter(i + 1, to_sqlite_value(value))
                .map_err(|e| DbRsError::binding(i + 1, e.to_string()))?;
        }
        Ok(())
    }
}

impl Statement for SqliteStatement<'_> {
    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<()> {
        self.slots.set(index, value)
    }

    fn query(&mut self) -> Result<Box<dyn Cursor + '_>> {
        self.bind_slots()?;
        let columns: Vec<String> = self.stmt.column_names().into_iter().map(String::from).collect();
        let rows = self.stmt.raw_query();
        Ok(Box::new(SqliteCursor {
            rows,
            columns: columns.into(),
        }))
    }

    fn execute(&mut self) -> Result<ExecuteOutcome> {
        self.bind_slots()?;
        let before = self.conn.last_insert_rowid();
        let changed = self.stmt.raw_execute().map_err(execution_failed)?;
        let after = self.conn.last_insert_rowid();

        // an UPDATE or a WITHOUT ROWID insert leaves the rowid untouched
        let generated_key = match self.keys {
            GeneratedKeys::Return if changed > 0 && after != before => Some(after),
            _ => None,
        };
        Ok(ExecuteOutcome::new(changed as u64, generated_key))
    }
}

struct SqliteCursor<'s> {
    rows: rusqlite::Rows<'s>,
    columns: Arc<[String]>,
}

impl Cursor for SqliteCursor<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(row) = self.rows.next().map_err(execution_failed)? else {
            return Ok(None);
        };
        let values = (0..self.columns.len())
            .map(|i| row.get_ref(i).map(from_value_ref).map_err(execution_failed))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(Row::new(Arc::clone(&self.columns), values)))
    }
}

fn to_sqlite_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Int32(i) => Value::Integer(i64::from(*i)),
        SqlValue::Int64(i) => Value::Integer(*i),
        SqlValue::Double(d) => Value::Real(*d),
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Timestamp(ts) => Value::Text(ts.format("%F %T%.f").to_string()),
        SqlValue::Bytes(b) => Value::Blob(b.clone()),
    }
}

fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Int64(i),
        ValueRef::Real(d) => SqlValue::Double(d),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Bytes(b.to_vec()),
    }
}
