//! Export document: the locally saved form of a pipeline run.
//!
//! Only ids and descriptions are persisted. Loading an export yields a run
//! whose datasets are detached (no content); the lineage graph itself is not
//! part of the document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::id::{DatasetId, RunId, StepId};
use crate::registry::DatasetRegistry;
use crate::run::{AnalysisContext, ContextEntry, PipelineRun, ProcessingStep};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub run_id: RunId,
    pub start_time: DateTime<Utc>,
    pub dataset_ids: Vec<DatasetId>,
    pub processing_steps: Vec<ExportStep>,
    pub data_profiles: Vec<ExportProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStep {
    pub id: StepId,
    pub description: String,
    pub input_datasets: Vec<DatasetId>,
    pub output_datasets: Vec<DatasetId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportProfile {
    pub dataset_id: DatasetId,
}

impl From<&ProcessingStep> for ExportStep {
    fn from(s: &ProcessingStep) -> Self {
        Self {
            id: s.id,
            description: s.description.clone(),
            input_datasets: s.input_datasets.clone(),
            output_datasets: s.output_datasets.clone(),
        }
    }
}

impl From<ExportStep> for ProcessingStep {
    fn from(s: ExportStep) -> Self {
        Self {
            id: s.id,
            description: s.description,
            input_datasets: s.input_datasets,
            output_datasets: s.output_datasets,
        }
    }
}

impl ExportDocument {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Conventional file name for a saved run.
    pub fn file_name(&self) -> String {
        format!("provflow_{}.json", self.run_id)
    }
}

impl PipelineRun {
    pub fn to_export(&self) -> ExportDocument {
        let dataset_ids = self.dataset_ids();
        ExportDocument {
            run_id: self.id(),
            start_time: self.start_time(),
            data_profiles: dataset_ids
                .iter()
                .map(|id| ExportProfile {
                    dataset_id: id.clone(),
                })
                .collect(),
            dataset_ids,
            processing_steps: self.steps().iter().map(ExportStep::from).collect(),
        }
    }

    /// Rebuild a run from an export. Datasets come back detached, and each
    /// step gets a context entry without schemas, stamped with the run's
    /// start time.
    pub fn from_export(doc: ExportDocument) -> Result<Self> {
        let mut registry = DatasetRegistry::new();
        for id in &doc.dataset_ids {
            registry.restore(id.clone(), doc.start_time);
        }
        let mut run = PipelineRun::from_parts(
            doc.run_id,
            doc.start_time,
            registry,
            Vec::new(),
            AnalysisContext::new(),
        );
        for step in doc.processing_steps {
            let entry = ContextEntry {
                timestamp: doc.start_time,
                input_schemas: vec![None; step.input_datasets.len()],
                output_schemas: vec![None; step.output_datasets.len()],
                description: step.description.clone(),
            };
            run.append_step(step.into(), entry)?;
        }
        Ok(run)
    }
}
