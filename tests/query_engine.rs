use std::sync::Arc;

use dbrs::drivers::{
    InMemoryTestDriver, InMemoryTestResponse, InMemoryTestResponseBuilder, StatementKind,
};
use dbrs::error::DbRsError;
use dbrs::types::{Row, SqlValue};
use dbrs::{
    BindingMode, ConnectionProvider, Driver, DriverRegistry, MsAccess, ParameterBinder, QueryEngine,
    Result, ResultMapper,
};

// Mapped type for Test_table_01(Id, nombre, edad)
#[derive(Debug, Default, PartialEq)]
struct Person {
    id: i32,
    nombre: String,
    edad: i32,
}

impl ResultMapper for Person {
    fn map_row(&mut self, row: &Row) -> Result<()> {
        self.id = row.get_i32("Id")?;
        self.nombre = row.get_str("nombre")?;
        self.edad = row.get_i32("edad")?;
        Ok(())
    }
}

fn person(id: i32, nombre: &str, edad: i32) -> Person {
    Person {
        id,
        nombre: nombre.to_string(),
        edad,
    }
}

fn people_table() -> InMemoryTestResponseBuilder {
    InMemoryTestResponseBuilder::new().columns(&["Id", "nombre", "edad"])
}

// A backend served by the in-memory driver
struct MemoryBackend {
    binding_mode: BindingMode,
}

impl ConnectionProvider for MemoryBackend {
    fn driver_id(&self) -> &str {
        "memory"
    }

    fn connection_url(&self) -> &str {
        "memory://test"
    }
}

impl ParameterBinder for MemoryBackend {
    fn binding_mode(&self) -> BindingMode {
        self.binding_mode
    }
}

fn registry(driver: &Arc<InMemoryTestDriver>) -> Arc<DriverRegistry> {
    let driver: Arc<dyn Driver> = driver.clone();
    Arc::new(DriverRegistry::new().with_driver("memory", driver))
}

fn engine_with(
    driver: &Arc<InMemoryTestDriver>,
    binding_mode: BindingMode,
) -> QueryEngine<MemoryBackend> {
    QueryEngine::with_registry(MemoryBackend { binding_mode }, registry(driver))
}

fn engine(driver: &Arc<InMemoryTestDriver>) -> QueryEngine<MemoryBackend> {
    engine_with(driver, BindingMode::Standard)
}

#[test]
fn test_query_maps_test_table_rows() {
    let in_memory_test_driver = Arc::new(
        InMemoryTestDriver::new().with_response(
            people_table()
                .row(vec![1.into(), "Ana".into(), 30.into()])
                .row(vec![2.into(), "Beto".into(), 41.into()])
                .build(),
        ),
    );

    let people = engine(&in_memory_test_driver)
        .execute_query("SELECT Id, nombre, edad FROM Test_table_01", Person::default)
        .unwrap();

    assert_eq!(people, vec![person(1, "Ana", 30), person(2, "Beto", 41)]);
    in_memory_test_driver.assert_last_query("SELECT Id, nombre, edad FROM Test_table_01", &[]);
    in_memory_test_driver.assert_query_count(1);
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_query_without_params_uses_plain_statement() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new());

    engine(&in_memory_test_driver)
        .execute_query("SELECT Id, nombre, edad FROM Test_table_01", Person::default)
        .unwrap();

    let last = in_memory_test_driver.last_statement().unwrap();
    assert_eq!(last.kind, StatementKind::Plain);
}

#[test]
fn test_zero_rows_is_empty_vec() {
    let in_memory_test_driver =
        Arc::new(InMemoryTestDriver::new().with_response(people_table().build()));

    let people = engine(&in_memory_test_driver)
        .execute_query_with_params(
            "SELECT Id, nombre, edad FROM Test_table_01 WHERE edad > ?",
            Person::default,
            &[SqlValue::from(99)],
        )
        .unwrap();

    assert!(people.is_empty());
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_results_keep_cursor_order() {
    let mut response = people_table();
    for i in (1..=25_i32).rev() {
        response = response.row(vec![i.into(), format!("p{i}").into(), (i * 2).into()]);
    }
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_response(response.build()));

    let people = engine(&in_memory_test_driver)
        .query_as::<Person>("SELECT Id, nombre, edad FROM Test_table_01 ORDER BY Id DESC", &[])
        .unwrap();

    let ids: Vec<i32> = people.iter().map(|p| p.id).collect();
    assert_eq!(ids, (1..=25).rev().collect::<Vec<_>>());
}

#[test]
fn test_params_bind_in_order() {
    let in_memory_test_driver = Arc::new(
        InMemoryTestDriver::new()
            .with_response(people_table().row(vec![2.into(), "Beto".into(), 41.into()]).build()),
    );

    let people = engine(&in_memory_test_driver)
        .execute_query_with_params(
            "SELECT Id, nombre, edad FROM Test_table_01 WHERE nombre = ? AND edad > ? AND Id < ?",
            Person::default,
            &[SqlValue::from("Beto"), SqlValue::from(40), SqlValue::from(10_i64)],
        )
        .unwrap();

    assert_eq!(people, vec![person(2, "Beto", 41)]);
    in_memory_test_driver.assert_last_query(
        "SELECT Id, nombre, edad FROM Test_table_01 WHERE nombre = ? AND edad > ? AND Id < ?",
        &[SqlValue::from("Beto"), SqlValue::from(40), SqlValue::Int64(10)],
    );
    assert_eq!(in_memory_test_driver.last_statement().unwrap().kind, StatementKind::Prepared);
}

#[test]
fn test_legacy_binding_skips_unsupported_kinds() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_update(1, None));

    let count = engine_with(&in_memory_test_driver, BindingMode::Legacy)
        .execute_update(
            "UPDATE Test_table_01 SET nombre = ?, activo = ?, edad = ? WHERE Id = ?",
            &[
                SqlValue::from("Ana"),
                SqlValue::from(true),
                SqlValue::from(31),
                SqlValue::from(1_i64),
            ],
        )
        .unwrap();

    assert_eq!(count, 1);
    let last = in_memory_test_driver.last_statement().unwrap();
    assert_eq!(
        last.params,
        vec![
            Some(SqlValue::from("Ana")),
            None,
            Some(SqlValue::Int32(31)),
            Some(SqlValue::Int32(1)),
        ]
    );
}

#[test]
fn test_execute_insert_without_generated_key_is_none() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_update(1, None));

    let key = engine(&in_memory_test_driver)
        .execute_insert(
            "INSERT INTO Test_table_01 (nombre, edad) VALUES (?, ?)",
            &[SqlValue::from("Carla"), SqlValue::from(27)],
        )
        .unwrap();

    assert_eq!(key, None);
    assert_eq!(
        in_memory_test_driver.last_statement().unwrap().kind,
        StatementKind::PreparedReturningKeys
    );
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_execute_insert_returns_generated_key() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_update(1, Some(3)));

    let key = engine(&in_memory_test_driver)
        .execute_insert(
            "INSERT INTO Test_table_01 (nombre, edad) VALUES (?, ?)",
            &[SqlValue::from("Carla"), SqlValue::from(27)],
        )
        .unwrap();

    assert_eq!(key, Some(3));
}

#[test]
fn test_execute_update_returns_reported_count() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_update(3, None));

    let count = engine(&in_memory_test_driver)
        .execute_update(
            "UPDATE Test_table_01 SET edad = edad + 1 WHERE edad > ?",
            &[SqlValue::from(20)],
        )
        .unwrap();

    assert_eq!(count, 3);
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_execute_insert_with_update_count() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_update(2, None));

    let count = engine(&in_memory_test_driver)
        .execute_insert_with_update_count(
            "INSERT INTO Test_table_01 (nombre, edad) VALUES (?, ?), (?, ?)",
            &[
                SqlValue::from("Dario"),
                SqlValue::from(50),
                SqlValue::from("Elena"),
                SqlValue::from(22),
            ],
        )
        .unwrap();

    assert_eq!(count, Some(2));
}

#[test]
fn test_unregistered_driver_fails() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new());
    let engine = QueryEngine::with_registry(
        MsAccess::new("data/people.accdb"),
        registry(&in_memory_test_driver),
    );

    let result = engine.execute_query("SELECT * FROM Test_table_01", Person::default);

    assert!(matches!(result, Err(DbRsError::DriverNotFound(ref id)) if id == "ucanaccess"));
    in_memory_test_driver.assert_query_count(0);
}

#[test]
fn test_connection_failure() {
    let in_memory_test_driver =
        Arc::new(InMemoryTestDriver::new().with_connect_error("host unreachable"));

    let result = engine(&in_memory_test_driver).execute_update("DELETE FROM Test_table_01", &[]);

    assert!(matches!(result, Err(DbRsError::ConnectionFailed(_))));
    in_memory_test_driver.assert_query_count(0);
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_preparation_failure_releases_connection() {
    let in_memory_test_driver = Arc::new(
        InMemoryTestDriver::new().with_prepare_error("syntax error at or near \"SELEC\""),
    );

    let result = engine(&in_memory_test_driver).query_as::<Person>("SELEC 1", &[]);

    assert!(matches!(result, Err(DbRsError::StatementPreparationFailed(_))));
    let counts = in_memory_test_driver.resource_counts();
    assert_eq!(counts.connections_opened, 1);
    assert!(counts.balanced());
}

#[test]
fn test_binding_out_of_range_fails() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new());

    let result = engine(&in_memory_test_driver).execute_update(
        "DELETE FROM Test_table_01 WHERE Id = ?",
        &[SqlValue::from(1), SqlValue::from(2)],
    );

    assert!(matches!(result, Err(DbRsError::BindingFailed { index: 2, .. })));
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_execution_failure() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_scripted(
        InMemoryTestResponse::Error("duplicate key value violates unique constraint".to_string()),
    ));

    let result = engine(&in_memory_test_driver).execute_insert(
        "INSERT INTO Test_table_01 (Id, nombre, edad) VALUES (?, ?, ?)",
        &[SqlValue::from(1), SqlValue::from("Ana"), SqlValue::from(30)],
    );

    assert!(matches!(result, Err(DbRsError::ExecutionFailed(_))));
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_cursor_failure_discards_partial_results() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_scripted(
        InMemoryTestResponse::RowsThenError(
            people_table().row(vec![1.into(), "Ana".into(), 30.into()]).build(),
            "connection reset".to_string(),
        ),
    ));

    let result = engine(&in_memory_test_driver)
        .query_as::<Person>("SELECT Id, nombre, edad FROM Test_table_01", &[]);

    assert!(matches!(
        result,
        Err(DbRsError::ExecutionFailed(ref msg)) if msg == "connection reset"
    ));
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_mapping_failure_reports_row() {
    let in_memory_test_driver = Arc::new(
        InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&["Id", "nombre"])
                .row(vec![1.into(), "Ana".into()])
                .build(),
        ),
    );

    let result = engine(&in_memory_test_driver)
        .query_as::<Person>("SELECT Id, nombre FROM Test_table_01", &[]);

    match result {
        Err(DbRsError::RowMappingFailed { row: 0, source }) => {
            assert!(matches!(*source, DbRsError::ColumnNotFound(ref c) if c == "edad"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    in_memory_test_driver.assert_resources_released();
}

#[test]
fn test_each_call_opens_its_own_connection() {
    let in_memory_test_driver = Arc::new(
        InMemoryTestDriver::new()
            .with_update(1, Some(1))
            .with_update(1, None),
    );
    let engine = engine(&in_memory_test_driver);

    engine
        .execute_insert(
            "INSERT INTO Test_table_01 (nombre, edad) VALUES (?, ?)",
            &[SqlValue::from("Ana"), SqlValue::from(30)],
        )
        .unwrap();
    engine
        .execute_update("DELETE FROM Test_table_01 WHERE Id = ?", &[SqlValue::from(1)])
        .unwrap();

    let counts = in_memory_test_driver.resource_counts();
    assert_eq!(counts.connections_opened, 2);
    assert_eq!(counts.statements_opened, 2);
    assert!(counts.balanced());
    assert_eq!(in_memory_test_driver.connection_urls(), vec!["memory://test".to_string(); 2]);
}
