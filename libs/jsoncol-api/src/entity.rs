use crate::error::ConvertError;
use crate::mapping::EntityMap;
use crate::schema::EntityType;
use crate::value::Row;

/// An entity type known to the mapping layer.
///
/// Usually derived with `#[derive(Entity)]`; mark properties to be stored as
/// JSON text with `#[json]`:
///
/// ```ignore
/// #[derive(Entity)]
/// #[entity(table = "orders")]
/// pub struct Order {
///     pub id: i64,
///     #[json]
///     pub metadata: Metadata,
/// }
/// ```
pub trait Entity: Sized + 'static {
    /// Schema description, properties in declaration order.
    fn entity_type() -> EntityType;

    /// Entity → column values, through the converters in `map`.
    fn to_row(&self, map: &EntityMap) -> Result<Row, ConvertError>;

    /// Column values → entity, through the converters in `map`.
    fn from_row(row: &Row, map: &EntityMap) -> Result<Self, ConvertError>;
}
