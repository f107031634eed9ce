use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::reference::ArtifactRef;
use crate::storage_traits::{RunId, RunLedger, RunRecord, RunSummary, StorageResult};

use super::write_atomic;

/// Run ledger keeping one JSON document per run under `<root>/runs/`.
/// Every mutation rewrites the document atomically.
#[derive(Debug, Clone)]
pub struct FsRunLedger {
    runs_dir: PathBuf,
}

impl FsRunLedger {
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let runs_dir = root.as_ref().join("runs");
        fs::create_dir_all(&runs_dir)?;
        Ok(Self { runs_dir })
    }

    fn run_path(&self, run_id: &RunId) -> PathBuf {
        self.runs_dir.join(format!("{}.json", run_id.0))
    }

    fn save(&self, record: &RunRecord) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.run_path(&record.run_id), &json)
    }

    fn modify(
        &self,
        run_id: &RunId,
        f: impl FnOnce(&mut RunRecord) -> StorageResult<()>,
    ) -> StorageResult<()> {
        let mut record = self.get_run(run_id)?;
        f(&mut record)?;
        self.save(&record)
    }
}

impl RunLedger for FsRunLedger {
    fn create_run(&self, job_type: &str) -> StorageResult<RunId> {
        let record = RunRecord::new(job_type);
        self.save(&record)?;
        Ok(record.run_id)
    }

    fn record_config(&self, run_id: &RunId, config: Map<String, Value>) -> StorageResult<()> {
        self.modify(run_id, |r| r.merge_config(config))
    }

    fn use_artifact(&self, run_id: &RunId, reference: &ArtifactRef) -> StorageResult<()> {
        self.modify(run_id, |r| r.push_used(reference))
    }

    fn log_artifact(&self, run_id: &RunId, reference: &ArtifactRef) -> StorageResult<()> {
        self.modify(run_id, |r| r.push_logged(reference))
    }

    fn finish_run(&self, run_id: &RunId, summary: RunSummary) -> StorageResult<()> {
        self.modify(run_id, |r| r.finish(summary))
    }

    fn get_run(&self, run_id: &RunId) -> StorageResult<RunRecord> {
        match fs::read(self.run_path(run_id)) {
            Ok(json) => Ok(serde_json::from_slice(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::RunNotFound {
                run_id: run_id.0.clone(),
            }),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
