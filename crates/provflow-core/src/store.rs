//! Persistence collaborator interface.
//!
//! Stores are called only at explicit save/load boundaries, never while a
//! run is executing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::export::ExportDocument;
use crate::id::RunId;
use crate::run::PipelineRun;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub start_time: DateTime<Utc>,
    pub datasets: usize,
    pub steps: usize,
}

impl From<&ExportDocument> for RunSummary {
    fn from(doc: &ExportDocument) -> Self {
        Self {
            run_id: doc.run_id,
            start_time: doc.start_time,
            datasets: doc.dataset_ids.len(),
            steps: doc.processing_steps.len(),
        }
    }
}

pub trait RunStore: Send + Sync {
    fn save_run(&self, run: &PipelineRun) -> Result<()>;

    /// Summaries of every saved run, newest first.
    fn list_runs(&self) -> Result<Vec<RunSummary>>;

    fn load_run(&self, id: RunId) -> Result<PipelineRun>;
}

/// Sort summaries newest first, breaking ties by run id.
pub fn sort_newest_first(runs: &mut [RunSummary]) {
    runs.sort_by(|a, b| {
        b.start_time
            .cmp(&a.start_time)
            .then_with(|| a.run_id.cmp(&b.run_id))
    });
}
