//! Run context: the explicit handle on one execution's run record.

use std::sync::Arc;
use std::time::Instant;

use artifact_ledger::{ArtifactRef, RunId, RunLedger, RunRecord, RunSummary, StorageResult};
use serde_json::{Map, Value};

use crate::obs;

/// Handle on the run record for one step execution.
///
/// Usage:
/// 1. Call [`RunContext::init`] to create a run in the ledger.
/// 2. Call [`RunContext::record_config`], [`RunContext::use_artifact`] and
///    [`RunContext::log_artifact`] while the step executes.
/// 3. Call [`RunContext::finish`] once, on success. It consumes the context.
///
/// A context dropped without `finish` leaves its run `Running`.
pub struct RunContext {
    ledger: Arc<dyn RunLedger>,
    run_id: RunId,
    job_type: String,
    started: Instant,
    metrics: Map<String, Value>,
}

impl RunContext {
    /// Start a new run in the ledger, returning a context bound to it.
    pub fn init(ledger: Arc<dyn RunLedger>, job_type: &str) -> StorageResult<Self> {
        let run_id = ledger.create_run(job_type)?;
        obs::emit_run_started(&run_id.to_string(), job_type);
        Ok(Self {
            ledger,
            run_id,
            job_type: job_type.to_string(),
            started: Instant::now(),
            metrics: Map::new(),
        })
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    /// Merge resolved parameters into the run's configuration snapshot.
    pub fn record_config(&mut self, config: Map<String, Value>) -> StorageResult<()> {
        let keys = config.len();
        self.ledger.record_config(&self.run_id, config)?;
        obs::emit_config_recorded(&self.run_id.to_string(), keys);
        Ok(())
    }

    /// Record an input artifact (lineage).
    pub fn use_artifact(&mut self, reference: &ArtifactRef) -> StorageResult<()> {
        self.ledger.use_artifact(&self.run_id, reference)
    }

    /// Record an output artifact (lineage).
    pub fn log_artifact(&mut self, reference: &ArtifactRef) -> StorageResult<()> {
        self.ledger.log_artifact(&self.run_id, reference)
    }

    /// Attach a figure to the summary written by [`RunContext::finish`].
    pub fn record_metric(&mut self, key: &str, value: impl Into<Value>) {
        self.metrics.insert(key.to_string(), value.into());
    }

    /// Finalize the run as completed and return the stored record.
    pub fn finish(self) -> StorageResult<RunRecord> {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let summary = RunSummary {
            duration_ms,
            success: true,
            metrics: Value::Object(self.metrics),
        };
        let run_id = self.run_id.to_string();
        if let Err(e) = self.ledger.finish_run(&self.run_id, summary) {
            obs::emit_run_finalize_error(&run_id, &e);
            return Err(e);
        }
        obs::emit_run_finished(&run_id, duration_ms, true);
        self.ledger.get_run(&self.run_id)
    }
}
