use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jsoncol_api::entity::Entity;
use jsoncol_api::mapping::EntityMap;
use jsoncol_api::value::Row;

use crate::error::EngineError;
use crate::model::Model;

#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    rows: BTreeMap<u64, Row>,
}

/// In-memory table store — the row read/write path.
///
/// Entities cross the storage boundary only here: `insert()` runs
/// `Entity::to_row` (converters encode), `get()` / `all()` run
/// `Entity::from_row` (converters decode). Stored rows hold column values
/// only.
#[derive(Debug)]
pub struct MemoryStore {
    model: Arc<Model>,
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new(model: Arc<Model>) -> Self {
        let tables = model
            .entities()
            .map(|e| (e.table.clone(), Table::default()))
            .collect();
        Self {
            model,
            tables: RwLock::new(tables),
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    fn read_tables(&self) -> RwLockReadGuard<'_, HashMap<String, Table>> {
        match self.tables.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("store read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_tables(&self) -> RwLockWriteGuard<'_, HashMap<String, Table>> {
        match self.tables.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("store write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Encode and store an entity. Returns the new row id.
    pub fn insert<E: Entity>(&self, entity: &E) -> Result<u64, EngineError> {
        let map = self.model.entity::<E>()?;
        let row = entity
            .to_row(map)
            .map_err(|e| EngineError::from(e).with_context(format!("table '{}'", map.table)))?;

        let mut tables = self.write_tables();
        let table = tables.entry(map.table.clone()).or_default();
        table.next_id += 1;
        let id = table.next_id;
        table.rows.insert(id, row);
        tracing::trace!(table = %map.table, id, "inserted row");
        Ok(id)
    }

    /// Load and decode one row. `Ok(None)` if the id is unknown.
    pub fn get<E: Entity>(&self, id: u64) -> Result<Option<E>, EngineError> {
        let map = self.model.entity::<E>()?;
        let tables = self.read_tables();
        let Some(row) = tables.get(&map.table).and_then(|t| t.rows.get(&id)) else {
            return Ok(None);
        };
        materialize(map, id, row).map(Some)
    }

    /// Load and decode every row of `E`'s table, in id order.
    pub fn all<E: Entity>(&self) -> Result<Vec<E>, EngineError> {
        let map = self.model.entity::<E>()?;
        let tables = self.read_tables();
        let Some(table) = tables.get(&map.table) else {
            return Ok(Vec::new());
        };
        table
            .rows
            .iter()
            .map(|(&id, row)| materialize(map, id, row))
            .collect()
    }

    /// Number of rows stored in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.read_tables().get(table).map_or(0, |t| t.rows.len())
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Stored column values of a row, as written.
    pub fn raw_row(&self, table: &str, id: u64) -> Option<Row> {
        self.read_tables().get(table)?.rows.get(&id).cloned()
    }

    /// Overwrite a row with raw column values, bypassing converters.
    ///
    /// The row must have one value per column of the table.
    pub fn put_raw_row(&self, table: &str, id: u64, row: Row) -> Result<(), EngineError> {
        let map = self
            .model
            .entities()
            .find(|e| e.table == table)
            .ok_or_else(|| EngineError::EntityNotFound(format!("table '{table}'")))?;
        map.check_row(&row)?;

        let mut tables = self.write_tables();
        let t = tables.entry(table.to_string()).or_default();
        t.next_id = t.next_id.max(id);
        t.rows.insert(id, row);
        Ok(())
    }
}

fn materialize<E: Entity>(map: &EntityMap, id: u64, row: &Row) -> Result<E, EngineError> {
    E::from_row(row, map)
        .map_err(|e| EngineError::from(e).with_context(format!("table '{}' row {id}", map.table)))
}
