use std::sync::Arc;

use crate::converter::ValueConverter;
use crate::error::ConvertError;
use crate::schema::{EntityType, PropertyDescriptor, StoreType};
use crate::value::{Column, ColumnValue, Row};

/// Storage strategy for a single property.
#[derive(Clone)]
pub enum Converter {
    /// Value stored as-is through `Column`.
    Native(StoreType),
    /// Registered converter (JSON text for `#[json]` properties).
    Value(Arc<dyn ValueConverter>),
}

impl Converter {
    pub fn store_type(&self) -> StoreType {
        match self {
            Converter::Native(store) => *store,
            Converter::Value(conv) => conv.store_type(),
        }
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Converter::Native(store) => f.debug_tuple("Native").field(store).finish(),
            Converter::Value(conv) => f
                .debug_tuple("Value")
                .field(&conv.model_type_name())
                .finish(),
        }
    }
}

/// One property — declared shape + storage column + converter.
#[derive(Debug, Clone)]
pub struct PropertyMap {
    pub property: PropertyDescriptor,
    pub column: String,
    pub converter: Converter,
}

/// Final storage mapping of one entity type.
///
/// Built once by the model builder, then read by generated `Entity::to_row` /
/// `Entity::from_row` code. Position in `properties` = position in `Row`.
#[derive(Debug, Clone)]
pub struct EntityMap {
    pub entity: EntityType,
    pub table: String,
    pub properties: Vec<PropertyMap>,
}

impl EntityMap {
    pub fn property(&self, name: &str) -> Option<&PropertyMap> {
        self.properties.iter().find(|p| p.property.name == name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.column.as_str())
    }

    /// Check that `row` has one value per mapped property.
    pub fn check_row(&self, row: &Row) -> Result<(), ConvertError> {
        if row.0.len() != self.properties.len() {
            return Err(ConvertError::schema(format!(
                "table '{}': row has {} values, expected {}",
                self.table,
                row.0.len(),
                self.properties.len()
            )));
        }
        Ok(())
    }

    fn converter_at(
        &self,
        index: usize,
    ) -> Result<(&PropertyMap, &Arc<dyn ValueConverter>), ConvertError> {
        let prop = self.properties.get(index).ok_or_else(|| {
            ConvertError::schema(format!(
                "table '{}': no property at position {index}",
                self.table
            ))
        })?;
        match &prop.converter {
            Converter::Value(conv) => Ok((prop, conv)),
            Converter::Native(_) => Err(ConvertError::config(format!(
                "{}.{}: no converter registered",
                self.entity.name, prop.property.name
            ))),
        }
    }

    /// Write a converted property value (the storage side of a converter).
    pub fn write_converted<T: 'static>(
        &self,
        index: usize,
        value: &T,
    ) -> Result<ColumnValue, ConvertError> {
        let (prop, conv) = self.converter_at(index)?;
        conv.to_column(value)
            .map_err(|e| e.with_context(format!("{}.{}", self.entity.name, prop.property.name)))
    }

    /// Read a converted property value back into `T`.
    pub fn read_converted<T: 'static>(
        &self,
        index: usize,
        stored: &ColumnValue,
    ) -> Result<T, ConvertError> {
        let (prop, conv) = self.converter_at(index)?;
        let ctx = || format!("{}.{}", self.entity.name, prop.property.name);
        let boxed = conv.from_column(stored).map_err(|e| e.with_context(ctx()))?;
        boxed.downcast::<T>().map(|b| *b).map_err(|_| {
            ConvertError::config(format!(
                "converter for {} produced a value of another type",
                conv.model_type_name()
            ))
            .with_context(ctx())
        })
    }

    /// Read a natively stored property, adding the property path to errors.
    pub fn read_native<T: Column>(
        &self,
        index: usize,
        stored: &ColumnValue,
    ) -> Result<T, ConvertError> {
        T::from_column(stored).map_err(|e| match self.properties.get(index) {
            Some(prop) => e.with_context(format!("{}.{}", self.entity.name, prop.property.name)),
            None => e,
        })
    }
}
