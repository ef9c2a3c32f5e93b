use thiserror::Error;

/// Error type for dbrs operations
#[derive(Debug, Error)]
pub enum DbRsError {
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Statement preparation failed: {0}")]
    StatementPreparationFailed(String),

    #[error("Binding parameter {index} failed: {message}")]
    BindingFailed { index: usize, message: String },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Mapping row {row} failed: {source}")]
    RowMappingFailed {
        row: usize,
        #[source]
        source: Box<DbRsError>,
    },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column {column}: expected {expected}, found {found}")]
    ColumnTypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Column {column} has unsupported type {type_name}")]
    UnsupportedColumnType { column: String, type_name: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DbRsError {
    pub(crate) fn binding(index: usize, message: impl Into<String>) -> Self {
        Self::BindingFailed {
            index,
            message: message.into(),
        }
    }
}

/// Result type alias for dbrs operations
pub type Result<T> = std::result::Result<T, DbRsError>;
