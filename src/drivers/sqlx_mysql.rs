use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column as _, Connection as _, Either, Executor as _, MySql, Row as _, TypeInfo as _};
use tokio::runtime::Runtime;
use tracing::debug;

use super::{blocking_runtime, decimal_value, BufferedCursor, ParamSlots};
use crate::error::{DbRsError, Result};
use crate::placeholders;
use crate::traits::{Connection, Cursor, Driver, GeneratedKeys, Statement};
use crate::types::{ExecuteOutcome, SqlValue};

/// MySQL driver implementation using sqlx.
///
/// Parameterized statements go through the binary protocol, plain statements
/// through the text protocol (some statements cannot be prepared on MySQL).
#[derive(Debug, Default)]
pub struct SqlxMySqlDriver;

impl SqlxMySqlDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Driver for SqlxMySqlDriver {
    fn connect(&self, url: &str) -> Result<Box<dyn Connection>> {
        let runtime = blocking_runtime()?;
        let conn = runtime
            .block_on(MySqlConnection::connect(url))
            .map_err(|e| DbRsError::ConnectionFailed(e.to_string()))?;
        Ok(Box::new(MySqlHandle {
            conn: Some(conn),
            runtime,
        }))
    }
}

struct MySqlHandle {
    // taken on drop to close gracefully
    conn: Option<MySqlConnection>,
    runtime: Runtime,
}

impl MySqlHandle {
    fn parts(&mut self) -> Result<(&Runtime, &mut MySqlConnection)> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| DbRsError::ExecutionFailed("connection already closed".to_string()))?;
        Ok((&self.runtime, conn))
    }
}

impl Drop for MySqlHandle {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = self.runtime.block_on(conn.close()) {
                debug!(error = %e, "MySQL connection did not close cleanly");
            }
        }
    }
}

impl Connection for MySqlHandle {
    fn prepare_statement(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<Box<dyn Statement + '_>> {
        let (runtime, conn) = self.parts()?;
        let prepared = runtime
            .block_on(conn.prepare(sql))
            .map_err(|e| DbRsError::StatementPreparationFailed(e.to_string()))?;

        let param_count = match sqlx::Statement::parameters(&prepared) {
            Some(Either::Left(types)) => types.len(),
            Some(Either::Right(count)) => count,
            None => placeholders::count(sql),
        };
        let columns = sqlx::Statement::columns(&prepared)
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        Ok(Box::new(MySqlStatementHandle {
            handle: self,
            sql: sql.to_string(),
            slots: ParamSlots::new(param_count),
            columns,
            plain: false,
            keys,
        }))
    }

    fn create_statement(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        Ok(Box::new(MySqlStatementHandle {
            handle: self,
            sql: sql.to_string(),
            slots: ParamSlots::new(0),
            columns: Vec::new(),
            plain: true,
            keys: GeneratedKeys::Ignore,
        }))
    }
}

struct MySqlStatementHandle<'c> {
    handle: &'c mut MySqlHandle,
    sql: String,
    slots: ParamSlots,
    columns: Vec<String>,
    plain: bool,
    keys: GeneratedKeys,
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Int32(v) => query.bind(*v),
        SqlValue::Int64(v) => query.bind(*v),
        SqlValue::Double(v) => query.bind(*v),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Timestamp(v) => query.bind(*v),
        SqlValue::Bytes(v) => query.bind(v.as_slice()),
    }
}

fn execution_failed(e: sqlx::Error) -> DbRsError {
    DbRsError::ExecutionFailed(e.to_string())
}

impl Statement for MySqlStatementHandle<'_> {
    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<()> {
        if self.plain {
            return Err(DbRsError::binding(index, "plain statements take no parameters"));
        }
        self.slots.set(index, value)
    }

    fn query(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let values = self.slots.values()?;
        let (runtime, conn) = self.handle.parts()?;

        let rows = if self.plain {
            runtime.block_on(conn.fetch_all(self.sql.as_str()))
        } else {
            let query = values
                .iter()
                .fold(sqlx::query(self.sql.as_str()), bind_value);
            runtime.block_on(query.fetch_all(&mut *conn))
        }
        .map_err(execution_failed)?;

        let columns = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => self.columns.clone(),
        };
        let decoded = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;

        Ok(Box::new(BufferedCursor::new(columns, decoded)))
    }

    fn execute(&mut self) -> Result<ExecuteOutcome> {
        let values = self.slots.values()?;
        let (runtime, conn) = self.handle.parts()?;

        let result = if self.plain {
            runtime.block_on(conn.execute(self.sql.as_str()))
        } else {
            let query = values
                .iter()
                .fold(sqlx::query(self.sql.as_str()), bind_value);
            runtime.block_on(query.execute(&mut *conn))
        }
        .map_err(execution_failed)?;

        let generated_key = match self.keys {
            // MySQL reports 0 when no AUTO_INCREMENT value was produced
            GeneratedKeys::Return if result.last_insert_id() > 0 => {
                i64::try_from(result.last_insert_id()).ok()
            }
            _ => None,
        };
        Ok(ExecuteOutcome::new(result.rows_affected(), generated_key))
    }
}

fn decode_row(row: &MySqlRow) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|i| decode_value(row, i)).collect()
}

/// Decode one column into a SqlValue based on the MySQL type name.
fn decode_value(row: &MySqlRow, index: usize) -> Result<SqlValue> {
    let column = &row.columns()[index];
    let type_name = column.type_info().name();

    let decoded = match type_name {
        "NULL" => Ok(None),
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index).map(|v| v.map(SqlValue::Bool)),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(index).map(|v| v.map(SqlValue::Int64))
        }
        // values past i64::MAX are kept as text rather than wrapped
        name if name.ends_with("UNSIGNED") => row.try_get::<Option<u64>, _>(index).map(|v| {
            v.map(|v| match i64::try_from(v) {
                Ok(v) => SqlValue::Int64(v),
                Err(_) => SqlValue::Text(v.to_string()),
            })
        }),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .map(|v| v.map(|v| SqlValue::Double(f64::from(v)))),
        "DOUBLE" => row.try_get::<Option<f64>, _>(index).map(|v| v.map(SqlValue::Double)),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| v.map(SqlValue::Timestamp)),
        "TIME" => row
            .try_get::<Option<MySqlTime>, _>(index)
            .map(|v| v.map(|v| SqlValue::Text(v.to_string()))),
        "YEAR" => row
            .try_get_unchecked::<Option<u16>, _>(index)
            .map(|v| v.map(|v| SqlValue::Int32(i32::from(v)))),
        "DECIMAL" => row
            .try_get::<Option<Decimal>, _>(index)
            .map(|v| v.map(decimal_value)),
        "JSON" => row
            .try_get_unchecked::<Option<String>, _>(index)
            .map(|v| v.map(SqlValue::Text)),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map(|v| v.map(|v| SqlValue::Timestamp(v.and_time(NaiveTime::MIN)))),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => {
            row.try_get::<Option<Vec<u8>>, _>(index).map(|v| v.map(SqlValue::Bytes))
        }
        // CHAR, VARCHAR, TEXT and ENUM decode as strings
        _ => match row.try_get::<Option<String>, _>(index) {
            Ok(v) => Ok(v.map(SqlValue::Text)),
            Err(_) => {
                return Err(DbRsError::UnsupportedColumnType {
                    column: column.name().to_string(),
                    type_name: type_name.to_string(),
                })
            }
        },
    };

    decoded.map(|v| v.unwrap_or(SqlValue::Null)).map_err(|e| {
        DbRsError::ExecutionFailed(format!("decoding column {}: {}", column.name(), e))
    })
}
