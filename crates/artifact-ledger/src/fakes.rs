//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryArtifactStore` and `MemoryRunLedger` that satisfy the
//! trait contracts without touching the filesystem (downloads still write
//! to the destination directory the caller passes in).

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::reference::{ArtifactAlias, ArtifactRef};
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryArtifactStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    blobs: HashMap<String, Vec<u8>>,
    /// "<project>/<name>" -> versions, index == version number
    versions: HashMap<String, Vec<ArtifactRecord>>,
}

/// In-memory artifact store backed by `HashMap`s.
#[derive(Debug)]
pub struct MemoryArtifactStore {
    project: String,
    state: Mutex<StoreState>,
}

impl MemoryArtifactStore {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            state: Mutex::new(StoreState::default()),
        }
    }
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new("default")
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn default_project(&self) -> &str {
        &self.project
    }

    fn resolve(&self, reference: &ArtifactRef) -> StorageResult<ArtifactRecord> {
        let project = reference.project_or(&self.project);
        let key = format!("{}/{}", project, reference.name());
        let state = self.state.lock().unwrap();
        let versions = state.versions.get(&key);
        let found = match reference.alias() {
            ArtifactAlias::Latest => versions.and_then(|v| v.last()),
            ArtifactAlias::Version(n) => versions.and_then(|v| v.get(n as usize)),
        };
        found
            .cloned()
            .ok_or_else(|| StorageError::ArtifactNotFound {
                reference: format!("{}:{}", key, reference.alias()),
            })
    }

    fn read_blob(&self, digest: &ContentDigest) -> StorageResult<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .blobs
            .get(digest.as_str())
            .cloned()
            .ok_or_else(|| StorageError::BlobNotFound {
                digest: digest.to_string(),
            })
    }

    fn upload(
        &self,
        draft: &ArtifactDraft,
        producer: Option<&RunId>,
    ) -> StorageResult<ArtifactRecord> {
        let staged = draft.stage()?;
        let key = format!("{}/{}", self.project, draft.name());
        let mut state = self.state.lock().unwrap();

        let latest = state.versions.get(&key).and_then(|v| v.last()).cloned();
        if let Some(current) = latest.as_ref().filter(|l| l.matches_staged(&staged)) {
            return Ok(current.clone());
        }
        let record =
            ArtifactRecord::next_version(&self.project, draft, &staged, latest.as_ref(), producer);

        for file in staged {
            state
                .blobs
                .insert(file.entry.digest.as_str().to_string(), file.bytes);
        }
        state.versions.entry(key).or_default().push(record.clone());
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// MemoryRunLedger
// ---------------------------------------------------------------------------

/// In-memory run ledger backed by a `HashMap<RunId, RunRecord>`.
#[derive(Debug, Default)]
pub struct MemoryRunLedger {
    runs: Mutex<HashMap<String, RunRecord>>,
}

impl MemoryRunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify(
        &self,
        run_id: &RunId,
        f: impl FnOnce(&mut RunRecord) -> StorageResult<()>,
    ) -> StorageResult<()> {
        let mut runs = self.runs.lock().unwrap();
        let record = runs
            .get_mut(&run_id.0)
            .ok_or_else(|| StorageError::RunNotFound {
                run_id: run_id.0.clone(),
            })?;
        f(record)
    }
}

impl RunLedger for MemoryRunLedger {
    fn create_run(&self, job_type: &str) -> StorageResult<RunId> {
        let record = RunRecord::new(job_type);
        let run_id = record.run_id.clone();
        let mut runs = self.runs.lock().unwrap();
        runs.insert(run_id.0.clone(), record);
        Ok(run_id)
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
        let runs = self.runs.lock().unwrap();
        runs.get(&run_id.0)
            .cloned()
            .ok_or_else(|| StorageError::RunNotFound {
                run_id: run_id.0.clone(),
            })
    }
}
