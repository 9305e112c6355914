//! Pipeline-run records: processing steps and the analysis context.
//!
//! A `PipelineRun` is an explicit value threaded through every operation.
//! Steps are appended once and never edited; the analysis context only ever
//! grows and holds schemas, never content.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::{DatasetId, RunId, StepId};
use crate::registry::DatasetRegistry;
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStep {
    pub id: StepId,
    pub description: String,
    pub input_datasets: Vec<DatasetId>,
    pub output_datasets: Vec<DatasetId>,
}

impl ProcessingStep {
    pub fn consumes(&self, dataset: &DatasetId) -> bool {
        self.input_datasets.contains(dataset)
    }

    pub fn produces(&self, dataset: &DatasetId) -> bool {
        self.output_datasets.contains(dataset)
    }
}

/// What the run remembers about a step beyond its ids. Schemas are `None`
/// when the dataset is detached (restored from an export).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub timestamp: DateTime<Utc>,
    pub input_schemas: Vec<Option<Schema>>,
    pub output_schemas: Vec<Option<Schema>>,
    pub description: String,
}

/// Append-only map from step id to its context entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisContext {
    entries: BTreeMap<StepId, ContextEntry>,
    order: Vec<StepId>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. An existing entry is never overwritten.
    pub fn append(&mut self, step: StepId, entry: ContextEntry) -> Result<()> {
        if self.entries.contains_key(&step) {
            return Err(Error::Invariant(format!(
                "analysis context already has an entry for step {step}"
            )));
        }
        self.entries.insert(step, entry);
        self.order.push(step);
        Ok(())
    }

    pub fn get(&self, step: &StepId) -> Option<&ContextEntry> {
        self.entries.get(step)
    }

    /// Entries in append order.
    pub fn iter(&self) -> impl Iterator<Item = (&StepId, &ContextEntry)> {
        self.order
            .iter()
            .filter_map(move |id| self.entries.get(id).map(|e| (id, e)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug)]
pub struct PipelineRun {
    id: RunId,
    start_time: DateTime<Utc>,
    registry: DatasetRegistry,
    steps: Vec<ProcessingStep>,
    context: AnalysisContext,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self::with_registry(DatasetRegistry::new())
    }

    /// Start a run around a registry (e.g. one built with a custom profiler).
    pub fn with_registry(registry: DatasetRegistry) -> Self {
        Self {
            id: RunId::fresh(),
            start_time: Utc::now(),
            registry,
            steps: Vec::new(),
            context: AnalysisContext::new(),
        }
    }

    /// Reassemble a run from persisted parts.
    pub fn from_parts(
        id: RunId,
        start_time: DateTime<Utc>,
        registry: DatasetRegistry,
        steps: Vec<ProcessingStep>,
        context: AnalysisContext,
    ) -> Self {
        Self {
            id,
            start_time,
            registry,
            steps,
            context,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DatasetRegistry {
        &mut self.registry
    }

    /// Known dataset ids in registration order.
    pub fn dataset_ids(&self) -> Vec<DatasetId> {
        self.registry.ids()
    }

    pub fn steps(&self) -> &[ProcessingStep] {
        &self.steps
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    /// Append a step together with its context entry. Fails without touching
    /// either list if the step id is already known.
    pub fn append_step(&mut self, step: ProcessingStep, entry: ContextEntry) -> Result<()> {
        if self.step(&step.id).is_some() {
            return Err(Error::Invariant(format!("step {} already recorded", step.id)));
        }
        self.context.append(step.id, entry)?;
        self.steps.push(step);
        Ok(())
    }

    pub fn step(&self, id: &StepId) -> Option<&ProcessingStep> {
        self.steps.iter().find(|s| &s.id == id)
    }

    pub fn steps_consuming<'a>(
        &'a self,
        dataset: &'a DatasetId,
    ) -> impl Iterator<Item = &'a ProcessingStep> + 'a {
        self.steps.iter().filter(move |s| s.consumes(dataset))
    }

    pub fn steps_producing<'a>(
        &'a self,
        dataset: &'a DatasetId,
    ) -> impl Iterator<Item = &'a ProcessingStep> + 'a {
        self.steps.iter().filter(move |s| s.produces(dataset))
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
