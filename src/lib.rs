//! dbrs - driver-agnostic SQL execution with typed row mapping
//!
//! A [`QueryEngine`] runs parameterized SQL against one backend (PostgreSQL,
//! MySQL, SQLite, or MS Access through a registered driver) and maps every
//! result row onto a caller type implementing [`ResultMapper`].
//!
//! # Example
//! ```no_run
//! use dbrs::{Postgres, QueryEngine, ResultMapper, Row, Result, SqlValue};
//!
//! #[derive(Default)]
//! struct Person {
//!     id: i32,
//!     name: String,
//!     age: i32,
//! }
//!
//! impl ResultMapper for Person {
//!     fn map_row(&mut self, row: &Row) -> Result<()> {
//!         self.id = row.get_i32("Id")?;
//!         self.name = row.get_str("nombre")?;
//!         self.age = row.get_i32("edad")?;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let engine = QueryEngine::new(Postgres::new("localhost", "test", "ernesto", "secret")?);
//!
//! let people: Vec<Person> = engine.execute_query_with_params(
//!     "SELECT Id, nombre, edad FROM Test_table_01 WHERE edad > ?",
//!     Person::default,
//!     &[SqlValue::from(18)],
//! )?;
//!
//! let id = engine.execute_insert(
//!     "INSERT INTO Test_table_01 (nombre, edad) VALUES (?, ?)",
//!     &[SqlValue::from("Carla"), SqlValue::from(27)],
//! )?;
//! # let _ = (people, id);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod placeholders;
pub mod traits;
pub mod types;

// Re-export main types for convenient access
pub use backends::{AnyBackend, BackendDescriptor, MsAccess, MySql, Postgres, Sqlite};
pub use config::BackendConfig;
pub use drivers::DriverRegistry;
pub use engine::QueryEngine;
pub use error::{DbRsError, Result};
pub use traits::{
    Backend, BindReport, BindingMode, Connection, ConnectionProvider, Cursor, Driver, GeneratedKeys,
    ParameterBinder, ResultMapper, Statement,
};
pub use types::{ExecuteOutcome, FromSqlValue, RawQueryResult, Row, SqlValue};
