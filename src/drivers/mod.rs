mod registry;
#[cfg(feature = "sqlite")]
mod rusqlite;
#[cfg(feature = "mysql")]
mod sqlx_mysql;
#[cfg(feature = "postgres")]
mod tokio_postgres;

pub use self::in_memory_test::{
    InMemoryTestDriver, InMemoryTestResponse, InMemoryTestResponseBuilder, ResourceCounts,
    StatementKind, RecordedStatement,
};
pub use self::registry::DriverRegistry;
#[cfg(feature = "sqlite")]
pub use self::rusqlite::RusqliteDriver;
#[cfg(feature = "mysql")]
pub use self::sqlx_mysql::SqlxMySqlDriver;
#[cfg(feature = "postgres")]
pub use self::tokio_postgres::TokioPostgresDriver;

use crate::error::{DbRsError, Result};
use crate::types::SqlValue;

pub const POSTGRES_DRIVER_ID: &str = "postgres";
pub const MYSQL_DRIVER_ID: &str = "mysql";
pub const SQLITE_DRIVER_ID: &str = "sqlite";
/// No driver is bundled for this id; register one to reach MS Access files.
pub const MS_ACCESS_DRIVER_ID: &str = "ucanaccess";

/// Parameter values collected by index until the statement executes.
#[cfg_attr(
    not(any(feature = "postgres", feature = "mysql", feature = "sqlite")),
    allow(dead_code)
)]
#[derive(Debug, Clone, Default)]
pub(crate) struct ParamSlots {
    slots: Vec<Option<SqlValue>>,
}

#[cfg_attr(
    not(any(feature = "postgres", feature = "mysql", feature = "sqlite")),
    allow(dead_code)
)]
impl ParamSlots {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Store `value` at 1-based `index`.
    pub(crate) fn set(&mut self, index: usize, value: &SqlValue) -> Result<()> {
        let count = self.slots.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or_else(|| {
                let message = format!("index out of range, statement has {count} parameter(s)");
                DbRsError::binding(index, message)
            })?;
        *slot = Some(value.clone());
        Ok(())
    }

    /// All values in index order; an unset slot is an error.
    pub(crate) fn values(&self) -> Result<Vec<SqlValue>> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.clone()
                    .ok_or_else(|| DbRsError::binding(i + 1, "no value specified for parameter"))
            })
            .collect()
    }
}

/// Current-thread runtime a blocking connection drives its async client on.
#[cfg(any(feature = "postgres", feature = "mysql"))]
pub(crate) fn blocking_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DbRsError::ConnectionFailed(format!("cannot start runtime: {e}")))
}

/// A fixed-point column value as a double when the conversion is exact,
/// otherwise as its decimal text.
#[cfg(any(feature = "postgres", feature = "mysql"))]
pub(crate) fn decimal_value(value: rust_decimal::Decimal) -> SqlValue {
    use rust_decimal::prelude::ToPrimitive;

    let normalized = value.normalize();
    match normalized.to_f64() {
        Some(d) if d.to_string().parse::<rust_decimal::Decimal>().ok() == Some(normalized) => {
            SqlValue::Double(d)
        }
        _ => SqlValue::Text(value.to_string()),
    }
}

/// Cursor over rows a client library returned all at once.
#[cfg(any(feature = "postgres", feature = "mysql"))]
pub(crate) struct BufferedCursor {
    columns: std::sync::Arc<[String]>,
    rows: std::vec::IntoIter<Vec<SqlValue>>,
}

#[cfg(any(feature = "postgres", feature = "mysql"))]
impl BufferedCursor {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns: columns.into(),
            rows: rows.into_iter(),
        }
    }
}

#[cfg(any(feature = "postgres", feature = "mysql"))]
impl crate::traits::Cursor for BufferedCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<crate::types::Row>> {
        Ok(self
            .rows
            .next()
            .map(|values| crate::types::Row::new(std::sync::Arc::clone(&self.columns), values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_slots() {
        let mut slots = ParamSlots::new(2);
        slots.set(2, &SqlValue::Int32(5)).unwrap();
        assert!(matches!(
            slots.values(),
            Err(DbRsError::BindingFailed { index: 1, .. })
        ));

        slots.set(1, &SqlValue::from("a")).unwrap();
        assert_eq!(
            slots.values().unwrap(),
            vec![SqlValue::Text("a".to_string()), SqlValue::Int32(5)]
        );

        assert!(matches!(
            slots.set(3, &SqlValue::Null),
            Err(DbRsError::BindingFailed { index: 3, .. })
        ));
        assert!(slots.set(0, &SqlValue::Null).is_err());
    }

    #[cfg(any(feature = "postgres", feature = "mysql"))]
    #[test]
    fn test_decimal_value() {
        use rust_decimal::Decimal;

        assert_eq!(decimal_value(Decimal::new(305, 1)), SqlValue::Double(30.5));
        assert_eq!(decimal_value(Decimal::new(3000, 2)), SqlValue::Double(30.0));
        assert_eq!(decimal_value(Decimal::new(1, 1)), SqlValue::Double(0.1));

        // more digits than a double carries
        let wide = "12345678901234567890.123".parse::<Decimal>().unwrap();
        assert_eq!(
            decimal_value(wide),
            SqlValue::Text("12345678901234567890.123".to_string())
        );
    }
}
