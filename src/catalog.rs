//! Table registry.
//!
//! Maps table ids to their heap files and names. Operators and the buffer
//! pool only ever resolve ids through this registry; durable naming is the
//! caller's concern.

use crate::access::heap::HeapFile;
use crate::access::schema::Schema;
use crate::error::{DbError, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    name: String,
    file: Arc<HeapFile>,
}

#[derive(Debug, Default)]
pub struct Catalog {
    tables: DashMap<TableId, TableEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `file` under `name`. A table already registered with the
    /// same name or id is replaced.
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>) -> TableId {
        let name = name.into();
        let table_id = file.table_id();
        self.tables
            .retain(|id, entry| *id == table_id || entry.name != name);
        self.tables.insert(table_id, TableEntry { name, file });
        table_id
    }

    /// Id of the table registered under `name`.
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.tables
            .iter()
            .find(|entry| entry.value().name == name)
            .map(|entry| *entry.key())
    }

    pub fn table_name(&self, table_id: TableId) -> Result<String> {
        self.tables
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or(DbError::UnknownTable(table_id))
    }

    pub fn database_file(&self, table_id: TableId) -> Result<Arc<HeapFile>> {
        self.tables
            .get(&table_id)
            .map(|entry| entry.file.clone())
            .ok_or(DbError::UnknownTable(table_id))
    }

    pub fn tuple_desc(&self, table_id: TableId) -> Result<Arc<Schema>> {
        Ok(self.database_file(table_id)?.schema().clone())
    }

    /// All registered table ids in ascending order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    pub fn clear(&self) {
        self.tables.clear();
    }
}
