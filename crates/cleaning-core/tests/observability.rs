//! Observability tests for the cleaning step lifecycle.
//!
//! These tests verify that structured tracing events are emitted for the
//! key stages: run start, artifact fetch, cleaning, publish and run finish.

use std::sync::Arc;

use artifact_ledger::fakes::{MemoryArtifactStore, MemoryRunLedger};
use artifact_ledger::{ArtifactDraft, ArtifactStore, RunLedger};
use cleaning_core::{
    emit_artifact_logged, emit_cleaning_applied, emit_run_finalize_error, emit_run_finished,
    emit_run_started, CleaningStats, CleaningStep, CleaningStrategy, IndexColumn, OutputSpec,
    RunContext, StepConfig, StepSpan, JOB_TYPE,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_run_started_logs_run_id_and_job_type() {
    emit_run_started("run-123", "basic_cleaning");
    assert!(logs_contain("run.started"));
    assert!(logs_contain("run-123"));
}

#[traced_test]
#[test]
fn test_emit_run_finished_logs_duration() {
    emit_run_finished("run-456", 5000, true);
    assert!(logs_contain("run.finished"));
    assert!(logs_contain("duration_ms=5000"));
}

#[traced_test]
#[test]
fn test_emit_cleaning_applied_logs_counts() {
    let stats = CleaningStats {
        rows_in: 10,
        rows_out: 7,
        ..Default::default()
    };
    emit_cleaning_applied("filter_normalize", &stats);
    assert!(logs_contain("OK - basic cleaning of dataframe"));
    assert!(logs_contain("rows_out=7"));
}

#[traced_test]
#[test]
fn test_emit_artifact_logged() {
    emit_artifact_logged("nyc_airbnb/clean_sample.csv:v3");
    assert!(logs_contain("OK - Logged artifact nyc_airbnb/clean_sample.csv:v3"));
}

#[traced_test]
#[test]
fn test_emit_run_finalize_error_logs_warning() {
    let error_msg = "run ledger unavailable";
    emit_run_finalize_error("run-err-001", &error_msg);
    assert!(logs_contain("WARN"));
    assert!(logs_contain("run.finalize_error"));
}

#[traced_test]
#[test]
fn test_step_span_enter_creates_span() {
    let span = StepSpan::enter("test-span-run", "basic_cleaning");
    tracing::info!("inside span");
    assert!(logs_contain("test-span-run"));
    drop(span);
}

#[traced_test]
#[test]
fn test_step_run_emits_stage_events() {
    let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new("nyc_airbnb"));
    let ledger: Arc<dyn RunLedger> = Arc::new(MemoryRunLedger::new());
    let work = tempfile::tempdir().expect("work dir");

    let input = work.path().join("sample.csv");
    std::fs::write(&input, "id,price\n1,50\n").expect("write input");
    let mut draft = ArtifactDraft::new("sample.csv", "raw_data", "Raw listings").expect("draft");
    draft.add_file(&input).expect("add file");
    store.upload(&draft, None).expect("seed input");

    let config = StepConfig {
        input_artifact: "sample.csv:latest".to_string(),
        output: OutputSpec {
            name: "clean_sample.csv".to_string(),
            artifact_type: "clean_sample".to_string(),
            description: "Cleaned listings".to_string(),
        },
        strategy: CleaningStrategy::NullFill,
        index: IndexColumn::Omit,
        work_dir: work.path().to_path_buf(),
    };

    let mut ctx = RunContext::init(ledger, JOB_TYPE).expect("init run");
    CleaningStep::new(store, config)
        .expect("valid config")
        .run(&mut ctx)
        .expect("step succeeds");
    ctx.finish().expect("finish run");

    assert!(logs_contain("OK - Fetched artifact sample.csv:latest"));
    assert!(logs_contain("OK - Read dataframe with 1 rows"));
    assert!(logs_contain("table.written"));
    assert!(logs_contain("OK - Logged artifact nyc_airbnb/clean_sample.csv:v0"));
    assert!(logs_contain("run.finished"));
}
