mod row;
mod sql_value;

pub use row::{ExecuteOutcome, RawQueryResult, Row};
pub use sql_value::{FromSqlValue, SqlValue};
