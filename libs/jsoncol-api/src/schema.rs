use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::converter::ValueConverter;
use crate::error::ConvertError;
use crate::factory::JsonConverterFactory;
use crate::value::Column;

/// Native column representation of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    Text,
    Int64,
    Float64,
    Bool,
}

/// Declarative tag attached to a property. Presence only — no parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Store the property as JSON text.
    Json,
}

/// Instantiates the converter for a property's declared type.
///
/// A monomorphized `fn` pointer: the generic type parameter is fixed where
/// the descriptor is built, so the scanner can call it without knowing `T`.
pub type ConverterHook =
    fn(&JsonConverterFactory) -> Result<Arc<dyn ValueConverter>, ConvertError>;

fn json_hook<T>(factory: &JsonConverterFactory) -> Result<Arc<dyn ValueConverter>, ConvertError>
where
    T: Serialize + DeserializeOwned + 'static,
{
    Ok(factory.converter::<T>())
}

/// A single declared property of an entity type.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    /// `std::any::type_name` of the declared type (for diagnostics only).
    pub type_name: &'static str,
    pub type_id: TypeId,
    /// `None` → the declared type has no native column form and needs a converter.
    pub store: Option<StoreType>,
    pub markers: Vec<Marker>,
    /// Set for `Marker::Json` properties.
    pub json: Option<ConverterHook>,
}

impl PropertyDescriptor {
    /// Property stored natively, no markers.
    pub fn column<T: Column + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            store: Some(T::STORE_TYPE),
            markers: Vec::new(),
            json: None,
        }
    }

    /// Property carrying `Marker::Json`, with the instantiation hook for `T`.
    pub fn json<T>(name: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self {
            name: name.into(),
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            store: None,
            markers: vec![Marker::Json],
            json: Some(json_hook::<T> as ConverterHook),
        }
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("store", &self.store)
            .field("markers", &self.markers)
            .field("json", &self.json.is_some())
            .finish()
    }
}

/// Schema description of one entity type: what the model scanner iterates.
///
/// Property order determines the position of each value in `Row`.
#[derive(Debug, Clone)]
pub struct EntityType {
    pub name: String,
    pub type_id: TypeId,
    /// Storage table name. Defaults to `name`; conventions may rewrite it.
    pub table: String,
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityType {
    pub fn new<E: 'static>(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table: name.clone(),
            name,
            type_id: TypeId::of::<E>(),
            properties: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Properties carrying `marker`, in declaration order.
    pub fn marked(&self, marker: Marker) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(move |p| p.has_marker(marker))
    }
}
