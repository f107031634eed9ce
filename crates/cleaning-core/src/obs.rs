//! Structured observability hooks for the cleaning step.
//!
//! This module provides:
//! - A run-scoped tracing span via the `StepSpan` RAII guard
//! - Emission functions for each stage: fetch, load, clean, write, publish
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).
//! For JSON output, pass `--json` to the binaries.

use std::path::Path;

use tracing::info;

use crate::strategy::CleaningStats;

/// RAII guard that enters a run-scoped tracing span for the duration of a step.
///
/// # Example
///
/// ```ignore
/// let _span = StepSpan::enter("run-12345", "basic_cleaning");
/// // All tracing calls are now associated with run_id = "run-12345"
/// ```
pub struct StepSpan {
    _span: tracing::span::EnteredSpan,
}

impl StepSpan {
    /// Create and enter a span tagged with the run id and job type.
    pub fn enter(run_id: &str, job_type: &str) -> Self {
        let span = tracing::info_span!("cleaning.run", run_id = %run_id, job_type = %job_type);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: run created in the ledger.
pub fn emit_run_started(run_id: &str, job_type: &str) {
    info!(event = "run.started", run_id = %run_id, job_type = %job_type);
}

/// Emit event: parameters recorded against the run.
pub fn emit_config_recorded(run_id: &str, keys: usize) {
    info!(event = "run.config_recorded", run_id = %run_id, keys = keys);
}

/// Emit event: input artifact resolved and downloaded.
pub fn emit_artifact_fetched(reference: &str, path: &Path) {
    info!(
        event = "artifact.fetched",
        reference = %reference,
        path = %path.display(),
        "OK - Fetched artifact {reference}"
    );
}

/// Emit event: input parsed into a table.
pub fn emit_table_loaded(rows: usize, columns: usize) {
    info!(
        event = "table.loaded",
        rows = rows,
        columns = columns,
        "OK - Read dataframe with {rows} rows"
    );
}

/// Emit event: strategy applied.
pub fn emit_cleaning_applied(strategy: &str, stats: &CleaningStats) {
    info!(
        event = "table.cleaned",
        strategy = %strategy,
        rows_in = stats.rows_in,
        rows_out = stats.rows_out,
        dates_normalized = stats.dates_normalized,
        dates_nulled = stats.dates_nulled,
        cells_filled = stats.cells_filled,
        "OK - basic cleaning of dataframe"
    );
}

/// Emit event: cleaned table written to the local intermediate file.
pub fn emit_table_written(path: &Path, rows: usize) {
    info!(event = "table.written", path = %path.display(), rows = rows);
}

/// Emit event: output artifact uploaded and attached to the run.
pub fn emit_artifact_logged(reference: &str) {
    info!(
        event = "artifact.logged",
        reference = %reference,
        "OK - Logged artifact {reference}"
    );
}

/// Emit event: run finalized.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        success = success,
    );
}

/// Emit event: run finalization error (warning level).
pub fn emit_run_finalize_error(run_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "run.finalize_error", run_id = %run_id, error = %error);
}

