use crate::error::Result;
use crate::types::{ExecuteOutcome, Row, SqlValue};

/// Whether a prepared statement should report generated keys after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKeys {
    Return,
    Ignore,
}

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Connecting to the database given a connection URL
/// - Converting SqlValue parameters to native types
/// - Decoding native rows into SqlValue rows
///
/// Every handle a driver returns releases its backend resource when dropped.
pub trait Driver: Send + Sync {
    /// Open a new connection. Fails with `ConnectionFailed`.
    fn connect(&self, url: &str) -> Result<Box<dyn Connection>>;
}

/// A live connection owned by a single engine call.
pub trait Connection {
    /// Prepare a statement with positional `?` placeholders.
    /// Fails with `StatementPreparationFailed`.
    fn prepare_statement(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<Box<dyn Statement + '_>>;

    /// Create a plain statement that takes no parameters.
    fn create_statement(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        self.prepare_statement(sql, GeneratedKeys::Ignore)
    }
}

/// A statement bound to its connection.
pub trait Statement {
    /// Bind a value at a 1-based parameter index.
    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<()>;

    /// Execute as a query and return a forward-only cursor over the rows.
    fn query(&mut self) -> Result<Box<dyn Cursor + '_>>;

    /// Execute as an update.
    fn execute(&mut self) -> Result<ExecuteOutcome>;
}

/// Forward-only iterator over a query's result rows.
pub trait Cursor {
    /// Column names of the result, in order.
    fn columns(&self) -> &[String];

    /// Advance to the next row. `Ok(None)` once exhausted.
    fn next_row(&mut self) -> Result<Option<Row>>;
}
