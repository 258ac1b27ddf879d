use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use jsoncol_api::converter::ValueConverter;
use jsoncol_api::entity::Entity;
use jsoncol_api::mapping::{Converter, EntityMap, PropertyMap};
use jsoncol_api::schema::{EntityType, PropertyDescriptor, StoreType};

use crate::error::EngineError;

/// Per-property configuration collected while the model is being built.
#[derive(Clone, Default)]
struct PropertyConfig {
    /// `None` → column named after the property.
    column: Option<String>,
    converter: Option<Arc<dyn ValueConverter>>,
}

struct EntityConfig {
    entity: EntityType,
    properties: Vec<PropertyConfig>,
}

impl EntityConfig {
    fn new(entity: EntityType) -> Self {
        let properties = vec![PropertyConfig::default(); entity.properties.len()];
        Self { entity, properties }
    }

    fn index_of(&self, property: &str) -> Result<usize, EngineError> {
        self.entity
            .properties
            .iter()
            .position(|p| p.name == property)
            .ok_or_else(|| EngineError::PropertyNotFound {
                entity: self.entity.name.clone(),
                property: property.to_string(),
            })
    }
}

/// Mutable model under construction.
///
/// Holds the schema description of every registered entity type plus the
/// per-property configuration (column name, converter). Scans and naming
/// conventions run against the builder; `build()` freezes it into a `Model`.
#[derive(Default)]
pub struct ModelBuilder {
    entities: Vec<EntityConfig>,
}

impl std::fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entities.iter().map(|e| &e.entity.name))
            .finish()
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a derived entity type. Registering the same type twice is a no-op.
    pub fn entity<E: Entity>(&mut self) -> &mut Self {
        self.add_entity_type(E::entity_type())
    }

    /// Register a hand-described entity type. Keyed by `type_id`; duplicates are ignored.
    pub fn add_entity_type(&mut self, entity: EntityType) -> &mut Self {
        if self.entities.iter().any(|e| e.entity.type_id == entity.type_id) {
            tracing::debug!(entity = %entity.name, "entity already registered");
            return self;
        }
        tracing::debug!(
            entity = %entity.name,
            properties = entity.properties.len(),
            "registered entity"
        );
        self.entities.push(EntityConfig::new(entity));
        self
    }

    /// Registered entity types, in registration order.
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.iter().map(|e| &e.entity)
    }

    fn entity_config(&self, entity: &str) -> Result<&EntityConfig, EngineError> {
        self.entities
            .iter()
            .find(|e| e.entity.name == entity)
            .ok_or_else(|| EngineError::EntityNotFound(entity.to_string()))
    }

    fn entity_config_mut(&mut self, entity: &str) -> Result<&mut EntityConfig, EngineError> {
        self.entities
            .iter_mut()
            .find(|e| e.entity.name == entity)
            .ok_or_else(|| EngineError::EntityNotFound(entity.to_string()))
    }

    /// Per-property configuration handle.
    pub fn property(
        &mut self,
        entity: &str,
        property: &str,
    ) -> Result<PropertyBuilder<'_>, EngineError> {
        let cfg = self.entity_config_mut(entity)?;
        let index = cfg.index_of(property)?;
        Ok(PropertyBuilder {
            entity: &cfg.entity.name,
            descriptor: &cfg.entity.properties[index],
            config: &mut cfg.properties[index],
        })
    }

    pub fn table_name(&self, entity: &str) -> Result<&str, EngineError> {
        Ok(&self.entity_config(entity)?.entity.table)
    }

    pub fn set_table_name(
        &mut self,
        entity: &str,
        table: impl Into<String>,
    ) -> Result<&mut Self, EngineError> {
        self.entity_config_mut(entity)?.entity.table = table.into();
        Ok(self)
    }

    /// Registered converter of a property, if any.
    pub fn converter(
        &self,
        entity: &str,
        property: &str,
    ) -> Result<Option<&Arc<dyn ValueConverter>>, EngineError> {
        let cfg = self.entity_config(entity)?;
        let index = cfg.index_of(property)?;
        Ok(cfg.properties[index].converter.as_ref())
    }

    /// Effective column name of a property.
    pub fn column_name(&self, entity: &str, property: &str) -> Result<&str, EngineError> {
        let cfg = self.entity_config(entity)?;
        let index = cfg.index_of(property)?;
        Ok(cfg.properties[index]
            .column
            .as_deref()
            .unwrap_or(&cfg.entity.properties[index].name))
    }

    /// Freeze into an immutable `Model`.
    ///
    /// Fails if any property has neither a native column form nor a converter,
    /// or if table / column names collide.
    pub fn build(self) -> Result<Model, EngineError> {
        let mut maps = Vec::with_capacity(self.entities.len());
        let mut by_type = HashMap::new();
        let mut tables = HashSet::new();

        for cfg in self.entities {
            let EntityConfig { entity, properties } = cfg;

            if !tables.insert(entity.table.clone()) {
                return Err(EngineError::Config(format!(
                    "table '{}' is mapped by more than one entity",
                    entity.table
                )));
            }

            let mut columns = HashSet::new();
            let mut property_maps = Vec::with_capacity(properties.len());
            for (descriptor, config) in entity.properties.iter().zip(properties) {
                let converter = match (config.converter, descriptor.store) {
                    (Some(conv), _) => Converter::Value(conv),
                    (None, Some(store)) => Converter::Native(store),
                    (None, None) => {
                        return Err(EngineError::Unmapped {
                            entity: entity.name.clone(),
                            property: descriptor.name.clone(),
                            type_name: descriptor.type_name.to_string(),
                        });
                    }
                };
                let column = config.column.unwrap_or_else(|| descriptor.name.clone());
                if !columns.insert(column.clone()) {
                    return Err(EngineError::Config(format!(
                        "table '{}': column '{column}' is mapped more than once",
                        entity.table
                    )));
                }
                property_maps.push(PropertyMap {
                    property: descriptor.clone(),
                    column,
                    converter,
                });
            }

            by_type.insert(entity.type_id, maps.len());
            maps.push(Arc::new(EntityMap {
                table: entity.table.clone(),
                entity,
                properties: property_maps,
            }));
        }

        tracing::info!(entities = maps.len(), "model built");
        Ok(Model {
            entities: maps,
            by_type,
        })
    }
}

/// Configuration handle for one property.
pub struct PropertyBuilder<'a> {
    entity: &'a str,
    descriptor: &'a PropertyDescriptor,
    config: &'a mut PropertyConfig,
}

impl PropertyBuilder<'_> {
    pub fn descriptor(&self) -> &PropertyDescriptor {
        self.descriptor
    }

    /// Install a converter for this property.
    ///
    /// The converter's model type must be the declared type. A property holds
    /// at most one converter: registering again replaces the previous one.
    pub fn has_conversion(
        &mut self,
        converter: Arc<dyn ValueConverter>,
    ) -> Result<&mut Self, EngineError> {
        if converter.model_type() != self.descriptor.type_id {
            return Err(EngineError::TypeMismatch {
                entity: self.entity.to_string(),
                property: self.descriptor.name.clone(),
                expected: self.descriptor.type_name.to_string(),
                actual: converter.model_type_name().to_string(),
            });
        }
        match &self.config.converter {
            Some(existing) if Arc::ptr_eq(existing, &converter) => {
                tracing::debug!(
                    entity = %self.entity,
                    property = %self.descriptor.name,
                    "converter already registered"
                );
            }
            Some(_) => {
                tracing::debug!(
                    entity = %self.entity,
                    property = %self.descriptor.name,
                    "replacing converter"
                );
                self.config.converter = Some(converter);
            }
            None => self.config.converter = Some(converter),
        }
        Ok(self)
    }

    pub fn has_column_name(&mut self, column: impl Into<String>) -> &mut Self {
        self.config.column = Some(column.into());
        self
    }

    pub fn converter(&self) -> Option<&Arc<dyn ValueConverter>> {
        self.config.converter.as_ref()
    }

    /// Final storage representation, if already resolved.
    pub fn store_type(&self) -> Option<StoreType> {
        match &self.config.converter {
            Some(conv) => Some(conv.store_type()),
            None => self.descriptor.store,
        }
    }
}

/// Immutable, fully mapped model. Shared by the row read/write path.
#[derive(Debug)]
pub struct Model {
    entities: Vec<Arc<EntityMap>>,
    by_type: HashMap<TypeId, usize>,
}

impl Model {
    pub fn entity<E: Entity>(&self) -> Result<&Arc<EntityMap>, EngineError> {
        self.by_type
            .get(&TypeId::of::<E>())
            .map(|&i| &self.entities[i])
            .ok_or_else(|| EngineError::EntityNotFound(std::any::type_name::<E>().to_string()))
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Arc<EntityMap>> {
        self.entities.iter().find(|e| e.entity.name == name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<EntityMap>> {
        self.entities.iter()
    }
}
