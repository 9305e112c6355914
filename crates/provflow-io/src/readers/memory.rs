//! In-memory loader for the `memory://` scheme. Used by tests and by
//! embedders that already hold their tables.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use provflow_core::error::Result as CoreResult;
use provflow_core::source::{SourceDescriptor, SourceLocation, SourceLoader};
use provflow_core::types::{Scalar, Table};

use crate::error::{Error, Result};

/// Thread-safe table map keyed by the part after `memory://`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    tables: Arc<RwLock<BTreeMap<String, Table>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, table: Table) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| Error::Poisoned("memory loader"))?;
        tables.insert(key.into(), table);
        Ok(())
    }

    /// Builder-style insert.
    pub fn with(self, key: impl Into<String>, table: Table) -> Result<Self> {
        self.insert(key, table)?;
        Ok(self)
    }

    fn get(&self, key: &str) -> Result<Table> {
        let tables = self
            .tables
            .read()
            .map_err(|_| Error::Poisoned("memory loader"))?;
        tables
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("memory://{key}")))
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, source: &SourceDescriptor) -> CoreResult<Table> {
        match source.location() {
            SourceLocation::Memory(key) => self
                .get(&key)
                .map(normalize_missing)
                .map_err(|e| e.into_collaborator("source loader")),
            SourceLocation::File(_) => Err(Error::NotFound(format!(
                "memory loader cannot read {source}"
            ))
            .into_collaborator("source loader")),
        }
    }
}

/// NaN cells become `Null`, the canonical missing marker.
fn normalize_missing(mut table: Table) -> Table {
    for column in &mut table.columns {
        for value in &mut column.values {
            if matches!(value, Scalar::F64(v) if v.is_nan()) {
                *value = Scalar::Null;
            }
        }
    }
    table
}
