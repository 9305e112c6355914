//! Content-addressed dataset registry.
//!
//! Identity comes from the profiling collaborator. `register` reuses an
//! existing entry when the content is identical (content equality, not
//! schema equality); `register_new` always appends, which is how step
//! outputs are recorded. Both paths produce the same id for the same
//! content, so an id never names two different contents.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::id::DatasetId;
use crate::profile::{ContentProfiler, Profile, Profiler};
use crate::schema::Schema;
use crate::types::Table;

/// Materialized part of a dataset entry.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub content: Arc<Table>,
    pub schema: Schema,
    pub profile: Profile,
}

/// One registry entry. Entries restored from an export document carry no
/// snapshot (their content was never persisted).
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: DatasetId,
    pub created_at: DateTime<Utc>,
    pub snapshot: Option<Snapshot>,
}

impl Dataset {
    pub fn is_detached(&self) -> bool {
        self.snapshot.is_none()
    }
}

pub struct DatasetRegistry {
    entries: Vec<Dataset>,
    profiler: Arc<dyn Profiler>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::with_profiler(Arc::new(ContentProfiler))
    }

    pub fn with_profiler(profiler: Arc<dyn Profiler>) -> Self {
        Self {
            entries: Vec::new(),
            profiler,
        }
    }

    /// Register content, reusing an existing entry if identical content is
    /// already known.
    pub fn register(&mut self, content: &Table) -> Result<DatasetId> {
        if let Some(id) = self.find(content) {
            tracing::debug!(dataset = %id.short(), "registry hit");
            return Ok(id);
        }
        self.insert(content)
    }

    /// Register content as a new entry even if identical content exists.
    pub fn register_new(&mut self, content: &Table) -> Result<DatasetId> {
        self.insert(content)
    }

    fn insert(&mut self, content: &Table) -> Result<DatasetId> {
        let out = self.profiler.profile(content)?;
        let id = DatasetId::from(out.hash);
        tracing::debug!(
            dataset = %id.short(),
            rows = content.num_rows(),
            columns = content.num_columns(),
            "registered dataset"
        );
        self.entries.push(Dataset {
            id: id.clone(),
            created_at: Utc::now(),
            snapshot: Some(Snapshot {
                content: Arc::new(content.clone()),
                schema: Schema::of(content),
                profile: out.profile,
            }),
        });
        Ok(id)
    }

    /// Linear equality scan over registered contents.
    pub fn find(&self, content: &Table) -> Option<DatasetId> {
        self.entries
            .iter()
            .find(|d| {
                d.snapshot
                    .as_ref()
                    .is_some_and(|s| s.content.same_content(content))
            })
            .map(|d| d.id.clone())
    }

    /// Append a detached entry (id only) when rebuilding a run from an export.
    pub fn restore(&mut self, id: DatasetId, created_at: DateTime<Utc>) {
        self.entries.push(Dataset {
            id,
            created_at,
            snapshot: None,
        });
    }

    fn snapshot(&self, id: &DatasetId) -> Option<&Snapshot> {
        self.entries
            .iter()
            .filter(|d| &d.id == id)
            .find_map(|d| d.snapshot.as_ref())
    }

    pub fn get(&self, id: &DatasetId) -> Option<Arc<Table>> {
        self.snapshot(id).map(|s| Arc::clone(&s.content))
    }

    pub fn schema(&self, id: &DatasetId) -> Option<&Schema> {
        self.snapshot(id).map(|s| &s.schema)
    }

    pub fn profile(&self, id: &DatasetId) -> Option<&Profile> {
        self.snapshot(id).map(|s| &s.profile)
    }

    pub fn dataset(&self, id: &DatasetId) -> Option<&Dataset> {
        self.entries.iter().find(|d| &d.id == id)
    }

    pub fn contains(&self, id: &DatasetId) -> bool {
        self.entries.iter().any(|d| &d.id == id)
    }

    /// Ids of all entries in registration order (duplicates preserved).
    pub fn ids(&self) -> Vec<DatasetId> {
        self.entries.iter().map(|d| d.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DatasetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
