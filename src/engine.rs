use std::sync::Arc;

use tracing::debug;

use crate::drivers::DriverRegistry;
use crate::error::{DbRsError, Result};
use crate::traits::{Backend, Connection, Cursor, GeneratedKeys, ResultMapper};
use crate::types::{ExecuteOutcome, SqlValue};

/// Runs SQL against one backend and maps the rows onto caller types.
///
/// Every operation opens its own connection, runs a single statement and
/// releases the cursor, the statement and the connection before returning,
/// on success and on failure alike. No transaction is opened.
#[derive(Debug, Clone)]
pub struct QueryEngine<B> {
    backend: B,
    registry: Arc<DriverRegistry>,
}

impl<B: Backend> QueryEngine<B> {
    /// An engine using every driver compiled into the crate.
    pub fn new(backend: B) -> Self {
        Self::with_registry(backend, Arc::new(DriverRegistry::with_default_drivers()))
    }

    /// An engine resolving drivers from `registry` only.
    pub fn with_registry(backend: B, registry: Arc<DriverRegistry>) -> Self {
        Self { backend, registry }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Run a query without parameters through a plain statement.
    ///
    /// `factory` is called once per row for a fresh instance which is then
    /// populated by its [`ResultMapper`]. Results keep the cursor order.
    pub fn execute_query<T, F>(&self, sql: &str, factory: F) -> Result<Vec<T>>
    where
        T: ResultMapper,
        F: FnMut() -> T,
    {
        debug!(driver = self.backend.driver_id(), sql, "executing query");
        let mut conn = self.open()?;
        let mut stmt = conn.create_statement(sql)?;
        let mut cursor = stmt.query()?;
        let results = collect(cursor.as_mut(), factory)?;
        debug!(rows = results.len(), "query finished");
        Ok(results)
    }

    /// Run a parameterized query; `args` bind to the `?` placeholders in order.
    pub fn execute_query_with_params<T, F>(
        &self,
        sql: &str,
        factory: F,
        args: &[SqlValue],
    ) -> Result<Vec<T>>
    where
        T: ResultMapper,
        F: FnMut() -> T,
    {
        debug!(
            driver = self.backend.driver_id(),
            sql,
            args = args.len(),
            "executing query"
        );
        let mut conn = self.open()?;
        let mut stmt = conn.prepare_statement(sql, GeneratedKeys::Ignore)?;
        self.backend.bind(stmt.as_mut(), args)?;
        let mut cursor = stmt.query()?;
        let results = collect(cursor.as_mut(), factory)?;
        debug!(rows = results.len(), "query finished");
        Ok(results)
    }

    /// Like [`execute_query_with_params`](Self::execute_query_with_params),
    /// using `T::default()` for every row.
    pub fn query_as<T>(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<T>>
    where
        T: ResultMapper + Default,
    {
        self.execute_query_with_params(sql, T::default, args)
    }

    /// Run an insert and return the first generated key, if the backend
    /// produced one.
    pub fn execute_insert(&self, sql: &str, args: &[SqlValue]) -> Result<Option<i64>> {
        let outcome = self.execute_statement(sql, args, GeneratedKeys::Return)?;
        Ok(outcome.generated_key)
    }

    /// Run an insert, update or delete and return the affected-row count.
    pub fn execute_update(&self, sql: &str, args: &[SqlValue]) -> Result<i64> {
        let outcome = self.execute_statement(sql, args, GeneratedKeys::Ignore)?;
        i64::try_from(outcome.rows_affected).map_err(|_| {
            let count = outcome.rows_affected;
            DbRsError::ExecutionFailed(format!("affected-row count {count} overflows i64"))
        })
    }

    /// Run an insert and return the affected-row count, or `None` when the
    /// count does not fit in an `i32`.
    pub fn execute_insert_with_update_count(
        &self,
        sql: &str,
        args: &[SqlValue],
    ) -> Result<Option<i32>> {
        let outcome = self.execute_statement(sql, args, GeneratedKeys::Ignore)?;
        Ok(i32::try_from(outcome.rows_affected).ok())
    }

    fn execute_statement(
        &self,
        sql: &str,
        args: &[SqlValue],
        keys: GeneratedKeys,
    ) -> Result<ExecuteOutcome> {
        debug!(
            driver = self.backend.driver_id(),
            sql,
            args = args.len(),
            "executing update"
        );
        let mut conn = self.open()?;
        let mut stmt = conn.prepare_statement(sql, keys)?;
        self.backend.bind(stmt.as_mut(), args)?;
        let outcome = stmt.execute()?;
        debug!(
            rows_affected = outcome.rows_affected,
            generated_key = outcome.generated_key,
            "update finished"
        );
        Ok(outcome)
    }

    fn open(&self) -> Result<Box<dyn Connection>> {
        let driver_id = self.backend.driver_id();
        let driver = self.registry.resolve(driver_id)?;
        let conn = driver.connect(self.backend.connection_url())?;
        debug!(driver = driver_id, "connection opened");
        Ok(conn)
    }
}

fn collect<C, T, F>(cursor: &mut C, mut factory: F) -> Result<Vec<T>>
where
    C: Cursor + ?Sized,
    T: ResultMapper,
    F: FnMut() -> T,
{
    let mut results = Vec::new();
    while let Some(row) = cursor.next_row()? {
        let mut item = factory();
        item.map_row(&row).map_err(|e| DbRsError::RowMappingFailed {
            row: results.len(),
            source: Box::new(e),
        })?;
        results.push(item);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendDescriptor;
    use crate::drivers::{InMemoryTestDriver, InMemoryTestResponseBuilder, StatementKind};
    use crate::types::Row;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        id: i32,
        name: String,
    }

    impl ResultMapper for Person {
        fn map_row(&mut self, row: &Row) -> Result<()> {
            self.id = row.get_i32("id")?;
            self.name = row.get_str("name")?;
            Ok(())
        }
    }

    fn engine(
        driver: InMemoryTestDriver,
    ) -> (Arc<InMemoryTestDriver>, QueryEngine<BackendDescriptor>) {
        let driver = Arc::new(driver);
        let registry = DriverRegistry::new().with_driver("memory", driver.clone());
        let backend = BackendDescriptor::new("memory", "memory://people");
        (driver, QueryEngine::with_registry(backend, Arc::new(registry)))
    }

    #[test]
    fn test_execute_query_maps_rows_in_order() {
        let (driver, engine) = engine(
            InMemoryTestDriver::new().with_response(
                InMemoryTestResponseBuilder::new()
                    .columns(&["id", "name"])
                    .row(vec![1.into(), "Ana".into()])
                    .row(vec![2.into(), "Beto".into()])
                    .build(),
            ),
        );

        let people = engine.execute_query("SELECT id, name FROM people", Person::default).unwrap();

        assert_eq!(
            people,
            vec![
                Person { id: 1, name: "Ana".to_string() },
                Person { id: 2, name: "Beto".to_string() },
            ]
        );
        assert_eq!(driver.last_statement().unwrap().kind, StatementKind::Plain);
        assert_eq!(driver.connection_urls(), vec!["memory://people".to_string()]);
        driver.assert_resources_released();
    }

    #[test]
    fn test_mapping_error_reports_row_position() {
        let (driver, engine) = engine(
            InMemoryTestDriver::new().with_response(
                InMemoryTestResponseBuilder::new()
                    .columns(&["id", "name"])
                    .row(vec![1.into(), "Ana".into()])
                    .row(vec![2.into(), SqlValue::Null])
                    .build(),
            ),
        );

        let err = engine
            .execute_query("SELECT id, name FROM people", Person::default)
            .unwrap_err();

        match err {
            DbRsError::RowMappingFailed { row, source } => {
                assert_eq!(row, 1);
                assert!(matches!(*source, DbRsError::ColumnTypeMismatch { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        driver.assert_resources_released();
    }

    #[test]
    fn test_insert_requests_generated_keys() {
        let (driver, engine) = engine(InMemoryTestDriver::new().with_update(1, Some(42)));

        let key = engine
            .execute_insert("INSERT INTO people (name) VALUES (?)", &[SqlValue::from("Ana")])
            .unwrap();

        assert_eq!(key, Some(42));
        let last = driver.last_statement().unwrap();
        assert_eq!(last.kind, StatementKind::PreparedReturningKeys);
        driver.assert_last_query("INSERT INTO people (name) VALUES (?)", &[SqlValue::from("Ana")]);
    }

    #[test]
    fn test_update_count_does_not_request_keys() {
        let (driver, engine) = engine(InMemoryTestDriver::new().with_update(2, Some(9)));

        let count = engine
            .execute_insert_with_update_count(
                "INSERT INTO people (name) SELECT name FROM staff",
                &[],
            )
            .unwrap();

        assert_eq!(count, Some(2));
        assert_eq!(driver.last_statement().unwrap().kind, StatementKind::Prepared);
    }

    #[test]
    fn test_update_count_overflowing_i32_is_none() {
        let (_driver, engine) =
            engine(InMemoryTestDriver::new().with_update(u64::from(u32::MAX), None));

        let count = engine
            .execute_insert_with_update_count("INSERT INTO big SELECT * FROM bigger", &[])
            .unwrap();

        assert_eq!(count, None);
    }

    #[test]
    fn test_unknown_driver_opens_nothing() {
        let driver = Arc::new(InMemoryTestDriver::new());
        let registry = DriverRegistry::new().with_driver("memory", driver.clone());
        let engine = QueryEngine::with_registry(
            BackendDescriptor::new("missing", "missing://db"),
            Arc::new(registry),
        );

        let err = engine.execute_update("DELETE FROM people", &[]).unwrap_err();

        assert!(matches!(err, DbRsError::DriverNotFound(ref id) if id == "missing"));
        assert!(driver.connection_urls().is_empty());
        driver.assert_query_count(0);
    }
}
