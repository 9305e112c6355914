use std::fs;
use std::path::{Path, PathBuf};

use provflow_core::error::Result as CoreResult;
use provflow_core::export::ExportDocument;
use provflow_core::id::RunId;
use provflow_core::run::PipelineRun;
use provflow_core::store::{sort_newest_first, RunStore, RunSummary};

use crate::error::{Error, Result};

const PREFIX: &str = "provflow_";
const SUFFIX: &str = ".json";

/// Saves runs as `provflow_<run_id>.json` under a directory.
#[derive(Debug, Clone)]
pub struct FsRunStore {
    root: PathBuf,
}

impl FsRunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: RunId) -> PathBuf {
        self.root.join(format!("{PREFIX}{id}{SUFFIX}"))
    }

    fn write(&self, doc: &ExportDocument) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(doc.run_id);
        fs::write(&path, serde_json::to_string_pretty(doc)?)?;
        tracing::info!(run = %doc.run_id, path = %path.display(), "run saved");
        Ok(path)
    }

    fn read(&self, path: &Path) -> Result<ExportDocument> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn documents(&self) -> Result<Vec<ExportDocument>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut docs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_run = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(PREFIX) && n.ends_with(SUFFIX));
            if !is_run || !path.is_file() {
                continue;
            }
            let doc = self.read(&path).map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "unreadable run file");
                Error::Unreadable {
                    path: path.clone(),
                    source: Box::new(e),
                }
            })?;
            docs.push(doc);
        }
        Ok(docs)
    }

    /// Save and return the written path.
    pub fn save(&self, run: &PipelineRun) -> Result<PathBuf> {
        self.write(&run.to_export())
    }

    pub fn load_document(&self, id: RunId) -> Result<ExportDocument> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(Error::NotFound(format!("run {id} in {}", self.root.display())));
        }
        self.read(&path)
    }
}

impl RunStore for FsRunStore {
    fn save_run(&self, run: &PipelineRun) -> CoreResult<()> {
        self.save(run)
            .map(|_| ())
            .map_err(|e| e.into_collaborator("run store"))
    }

    fn list_runs(&self) -> CoreResult<Vec<RunSummary>> {
        let mut runs: Vec<RunSummary> = self
            .documents()
            .map_err(|e| e.into_collaborator("run store"))?
            .iter()
            .map(RunSummary::from)
            .collect();
        sort_newest_first(&mut runs);
        Ok(runs)
    }

    fn load_run(&self, id: RunId) -> CoreResult<PipelineRun> {
        let doc = self
            .load_document(id)
            .map_err(|e| e.into_collaborator("run store"))?;
        PipelineRun::from_export(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provflow_core::types::{Scalar, Table};

    #[test]
    fn save_list_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::new(dir.path());
        let mut run = PipelineRun::new();
        run.registry_mut()
            .register(&Table::from_rows(&["a"], vec![vec![Scalar::I64(1)]]))
            .unwrap();

        store.save_run(&run).unwrap();
        assert!(store.path_for(run.id()).exists());

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, run.id());
        assert_eq!(runs[0].datasets, 1);

        let loaded = store.load_run(run.id()).unwrap();
        assert_eq!(loaded.to_export(), run.to_export());
    }

    #[test]
    fn missing_run_is_a_collaborator_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsRunStore::new(dir.path()).load_run(RunId::fresh()).unwrap_err();
        assert_eq!(err.kind(), "CollaboratorFailure");
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();
        std::fs::write(dir.path().join("provflow_notes.txt"), "hello").unwrap();
        assert!(FsRunStore::new(dir.path()).list_runs().unwrap().is_empty());
    }

    #[test]
    fn corrupt_run_file_fails_the_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRunStore::new(dir.path());
        store.save_run(&PipelineRun::new()).unwrap();
        std::fs::write(dir.path().join("provflow_bad.json"), "not json").unwrap();

        let err = store.list_runs().unwrap_err();
        assert_eq!(err.kind(), "CollaboratorFailure");
        assert!(err.to_string().contains("provflow_bad.json"));
    }
}
