use std::error::Error;

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tokio::runtime::Runtime;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tracing::error;

use super::{blocking_runtime, decimal_value, BufferedCursor, ParamSlots};
use crate::error::{DbRsError, Result};
use crate::placeholders;
use crate::traits::{Connection, Cursor, Driver, GeneratedKeys, Statement};
use crate::types::{ExecuteOutcome, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
///
/// Each connection owns a current-thread runtime and blocks on it, so the
/// driver can be used from plain synchronous code.
#[derive(Debug, Default)]
pub struct TokioPostgresDriver;

impl TokioPostgresDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Driver for TokioPostgresDriver {
    fn connect(&self, url: &str) -> Result<Box<dyn Connection>> {
        let runtime = blocking_runtime()?;
        let (client, connection) = runtime
            .block_on(tokio_postgres::connect(url, NoTls))
            .map_err(|e| DbRsError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler; it runs whenever the runtime is blocked on
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Box::new(PgConnection { client, runtime }))
    }
}

// Field order matters: the client must drop before the runtime.
struct PgConnection {
    client: Client,
    runtime: Runtime,
}

impl Connection for PgConnection {
    fn prepare_statement(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<Box<dyn Statement + '_>> {
        let numbered = placeholders::to_numbered(sql);
        let sql = match keys {
            GeneratedKeys::Return => with_returning(&numbered),
            GeneratedKeys::Ignore => numbered.into_owned(),
        };

        let statement = self
            .runtime
            .block_on(self.client.prepare(&sql))
            .map_err(|e| DbRsError::StatementPreparationFailed(e.to_string()))?;
        let slots = ParamSlots::new(statement.params().len());

        Ok(Box::new(PgStatement {
            conn: &*self,
            statement,
            slots,
            keys,
        }))
    }
}

/// Append `RETURNING *` unless the statement already has a RETURNING clause.
/// Trailing comments and semicolons are cut first so the clause stays live.
fn with_returning(sql: &str) -> String {
    if placeholders::contains_keyword(sql, "returning") {
        return sql.to_string();
    }
    let mut out = sql[..placeholders::statement_len(sql)].to_string();
    out.push_str("\nRETURNING *");
    out
}

struct PgStatement<'c> {
    conn: &'c PgConnection,
    statement: tokio_postgres::Statement,
    slots: ParamSlots,
    keys: GeneratedKeys,
}

impl PgStatement<'_> {
    fn fetch(&self, values: &[SqlValue]) -> Result<Vec<tokio_postgres::Row>> {
        let params: Vec<PgParam<'_>> = values.iter().map(PgParam).collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        self.conn
            .runtime
            .block_on(self.conn.client.query(&self.statement, &param_refs))
            .map_err(|e| DbRsError::ExecutionFailed(e.to_string()))
    }
}

impl Statement for PgStatement<'_> {
    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<()> {
        self.slots.set(index, value)
    }

    fn query(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let values = self.slots.values()?;
        let rows = self.fetch(&values)?;

        let columns: Vec<String> = self
            .statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let decoded = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;

        Ok(Box::new(BufferedCursor::new(columns, decoded)))
    }

    fn execute(&mut self) -> Result<ExecuteOutcome> {
        let values = self.slots.values()?;

        if self.keys == GeneratedKeys::Return {
            let rows = self.fetch(&values)?;
            let generated_key = rows.first().and_then(key_value);
            return Ok(ExecuteOutcome::new(rows.len() as u64, generated_key));
        }

        let params: Vec<PgParam<'_>> = values.iter().map(PgParam).collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows_affected = self
            .conn
            .runtime
            .block_on(self.conn.client.execute(&self.statement, &param_refs))
            .map_err(|e| DbRsError::ExecutionFailed(e.to_string()))?;

        Ok(ExecuteOutcome::new(rows_affected, None))
    }
}

/// First column of the first returned row, when it is an integer.
///
/// The row is already committed by now, so anything else (a uuid key, a
/// NULL, a decode failure) reads as "no key" rather than an error.
fn key_value(row: &tokio_postgres::Row) -> Option<i64> {
    let column = row.columns().first()?;
    if !is_key_type(column.type_()) {
        return None;
    }
    match decode_value(row, 0).ok()? {
        SqlValue::Int32(v) => Some(i64::from(v)),
        SqlValue::Int64(v) => Some(v),
        _ => None,
    }
}

fn is_key_type(ty: &Type) -> bool {
    matches!(*ty, Type::INT2 | Type::INT4 | Type::INT8 | Type::OID)
}

fn decode_row(row: &tokio_postgres::Row) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|i| decode_value(row, i)).collect()
}

/// Decode one column into a SqlValue based on its PostgreSQL type.
fn decode_value(row: &tokio_postgres::Row, index: usize) -> Result<SqlValue> {
    let column = &row.columns()[index];
    let decoded = match *column.type_() {
        Type::BOOL => row.try_get::<_, Option<bool>>(index).map(|v| v.map(SqlValue::Bool)),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)
            .map(|v| v.map(|v| SqlValue::Int32(i32::from(v)))),
        Type::INT4 => row.try_get::<_, Option<i32>>(index).map(|v| v.map(SqlValue::Int32)),
        Type::INT8 => row.try_get::<_, Option<i64>>(index).map(|v| v.map(SqlValue::Int64)),
        Type::OID => row
            .try_get::<_, Option<u32>>(index)
            .map(|v| v.map(|v| SqlValue::Int64(i64::from(v)))),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)
            .map(|v| v.map(|v| SqlValue::Double(f64::from(v)))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index).map(|v| v.map(SqlValue::Double)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(index).map(|v| v.map(SqlValue::Text))
        }
        Type::NUMERIC => row
            .try_get::<_, Option<Decimal>>(index)
            .map(|v| v.map(decimal_value)),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(index)
            .map(|v| v.map(SqlValue::Bytes)),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(index)
            .map(|v| v.map(SqlValue::Timestamp)),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(index)
            .map(|v| v.map(|v| SqlValue::Timestamp(v.naive_utc()))),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(index)
            .map(|v| v.map(|v| SqlValue::Timestamp(v.and_time(NaiveTime::MIN)))),
        _ => {
            return Err(DbRsError::UnsupportedColumnType {
                column: column.name().to_string(),
                type_name: column.type_().to_string(),
            })
        }
    };

    decoded.map(|v| v.unwrap_or(SqlValue::Null)).map_err(|e| {
        DbRsError::ExecutionFailed(format!("decoding column {}: {}", column.name(), e))
    })
}

/// A SqlValue coerced to the parameter type PostgreSQL inferred for its placeholder.
#[derive(Debug)]
struct PgParam<'a>(&'a SqlValue);

type BoxError = Box<dyn Error + Sync + Send>;

fn cannot_bind(value: &SqlValue, ty: &Type) -> BoxError {
    format!("cannot bind {} to {}", value.kind(), ty).into()
}

fn int_to_sql(value: i64, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(value)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(value)?.to_sql(ty, out),
        Type::INT8 => value.to_sql(ty, out),
        Type::OID => u32::try_from(value)?.to_sql(ty, out),
        Type::FLOAT4 => (value as f32).to_sql(ty, out),
        Type::FLOAT8 => (value as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(value).to_sql(ty, out),
        _ => Err(format!("cannot bind integer to {}", ty).into()),
    }
}

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match self.0 {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Text(s) if <&str as ToSql>::accepts(ty) => s.as_str().to_sql(ty, out),
            SqlValue::Text(s) if *ty == Type::NUMERIC => {
                s.trim().parse::<Decimal>()?.to_sql(ty, out)
            }
            SqlValue::Int32(v) => int_to_sql(i64::from(*v), ty, out),
            SqlValue::Int64(v) => int_to_sql(*v, ty, out),
            SqlValue::Double(v) => match *ty {
                Type::FLOAT8 => v.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::NUMERIC => Decimal::from_f64(*v)
                    .ok_or_else(|| cannot_bind(self.0, ty))?
                    .to_sql(ty, out),
                _ => Err(cannot_bind(self.0, ty)),
            },
            SqlValue::Bool(b) if *ty == Type::BOOL => b.to_sql(ty, out),
            SqlValue::Timestamp(ts) => match *ty {
                Type::TIMESTAMP => ts.to_sql(ty, out),
                Type::TIMESTAMPTZ => {
                    DateTime::<Utc>::from_naive_utc_and_offset(*ts, Utc).to_sql(ty, out)
                }
                Type::DATE => ts.date().to_sql(ty, out),
                _ => Err(cannot_bind(self.0, ty)),
            },
            SqlValue::Bytes(b) if *ty == Type::BYTEA => b.as_slice().to_sql(ty, out),
            other => Err(cannot_bind(other, ty)),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Coercion happens per value in to_sql
        true
    }

    to_sql_checked!();
}
