use crate::error::Result;
use crate::types::Row;

/// Trait implemented by every type a query result row is mapped onto.
///
/// The implementation reads the columns it needs by name and populates its
/// own fields. Errors from [`Row`] getters should be propagated with `?`;
/// the engine reports them as `RowMappingFailed` with the row position.
///
/// # Example
/// ```
/// use dbrs::{ResultMapper, Row, Result};
///
/// #[derive(Default)]
/// struct Person {
///     id: i32,
///     name: String,
/// }
///
/// impl ResultMapper for Person {
///     fn map_row(&mut self, row: &Row) -> Result<()> {
///         self.id = row.get_i32("Id")?;
///         self.name = row.get_str("nombre")?;
///         Ok(())
///     }
/// }
/// ```
pub trait ResultMapper {
    fn map_row(&mut self, row: &Row) -> Result<()>;
}
