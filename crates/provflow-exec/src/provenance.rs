//! Provenance recorder: the single point where processing steps are
//! appended to a run.
//!
//! Inputs are resolved by content (`register`), outputs are always
//! registered as new entries. The step and its context entry are appended
//! only after every dataset is registered.

use chrono::Utc;

use provflow_core::error::Result;
use provflow_core::id::{DatasetId, StepId};
use provflow_core::run::{ContextEntry, PipelineRun, ProcessingStep};
use provflow_core::types::Table;
use provflow_operators::{Selectors, TransformKind};

use crate::describe::GuardedDescriber;

/// Register `inputs` and `outputs` in the run's registry and append a step.
pub fn record_step(
    run: &mut PipelineRun,
    description: impl Into<String>,
    inputs: &[&Table],
    outputs: &[&Table],
) -> Result<ProcessingStep> {
    let registry = run.registry_mut();
    let input_ids = inputs
        .iter()
        .map(|t| registry.register(t))
        .collect::<Result<Vec<_>>>()?;
    let output_ids = outputs
        .iter()
        .map(|t| registry.register_new(t))
        .collect::<Result<Vec<_>>>()?;
    record_step_with_ids(run, description, input_ids, output_ids)
}

/// Append a step for datasets that are already registered.
pub fn record_step_with_ids(
    run: &mut PipelineRun,
    description: impl Into<String>,
    input_datasets: Vec<DatasetId>,
    output_datasets: Vec<DatasetId>,
) -> Result<ProcessingStep> {
    let description = description.into();
    let schemas = |ids: &[DatasetId]| {
        ids.iter()
            .map(|id| run.registry().schema(id).cloned())
            .collect::<Vec<_>>()
    };
    let entry = ContextEntry {
        timestamp: Utc::now(),
        input_schemas: schemas(&input_datasets),
        output_schemas: schemas(&output_datasets),
        description: description.clone(),
    };
    let step = ProcessingStep {
        id: StepId::fresh(),
        description,
        input_datasets,
        output_datasets,
    };
    run.append_step(step.clone(), entry)?;
    tracing::debug!(
        step = %step.id,
        inputs = step.input_datasets.len(),
        outputs = step.output_datasets.len(),
        "step recorded"
    );
    Ok(step)
}

/// Describer plus recording, as used by the engine.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceRecorder {
    describer: GuardedDescriber,
}

impl ProvenanceRecorder {
    pub fn new(describer: GuardedDescriber) -> Self {
        Self { describer }
    }

    pub fn describer(&self) -> &GuardedDescriber {
        &self.describer
    }

    pub fn record(
        &self,
        run: &mut PipelineRun,
        kind: TransformKind,
        selectors: &Selectors,
        inputs: &[&Table],
        outputs: &[&Table],
    ) -> Result<ProcessingStep> {
        let description = self.describer.describe(kind, selectors);
        record_step(run, description, inputs, outputs)
    }
}
