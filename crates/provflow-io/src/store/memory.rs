use std::collections::BTreeMap;
use std::sync::Mutex;

use provflow_core::error::Result as CoreResult;
use provflow_core::export::ExportDocument;
use provflow_core::id::RunId;
use provflow_core::run::PipelineRun;
use provflow_core::store::{sort_newest_first, RunStore, RunSummary};

use crate::error::Error;

/// Keeps export documents in memory. Saving a run twice replaces the
/// earlier document.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    docs: Mutex<BTreeMap<RunId, ExportDocument>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CoreResult<std::sync::MutexGuard<'_, BTreeMap<RunId, ExportDocument>>> {
        self.docs
            .lock()
            .map_err(|_| Error::Poisoned("run store").into_collaborator("run store"))
    }
}

impl RunStore for MemoryRunStore {
    fn save_run(&self, run: &PipelineRun) -> CoreResult<()> {
        let doc = run.to_export();
        self.lock()?.insert(doc.run_id, doc);
        Ok(())
    }

    fn list_runs(&self) -> CoreResult<Vec<RunSummary>> {
        let mut runs: Vec<RunSummary> = self.lock()?.values().map(RunSummary::from).collect();
        sort_newest_first(&mut runs);
        Ok(runs)
    }

    fn load_run(&self, id: RunId) -> CoreResult<PipelineRun> {
        let doc = self
            .lock()?
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("run {id}")).into_collaborator("run store"))?;
        PipelineRun::from_export(doc)
    }
}
