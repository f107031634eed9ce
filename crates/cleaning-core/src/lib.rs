//! Basic cleaning step.
//!
//! Fetches a tabular artifact from an [`ArtifactStore`], applies a
//! [`CleaningStrategy`], writes the result to a local CSV file and publishes
//! it as a new artifact version. Input and output are recorded against a
//! [`RunContext`] so the run ledger carries the lineage.
//!
//! ```ignore
//! let mut ctx = RunContext::init(ledger, JOB_TYPE)?;
//! let output = CleaningStep::new(store, config)?.run(&mut ctx)?;
//! ctx.finish()?;
//! println!("{}", output.artifact);
//! ```
//!
//! [`ArtifactStore`]: artifact_ledger::ArtifactStore

pub mod context;
pub mod dates;
pub mod error;
pub mod obs;
pub mod step;
pub mod strategy;
pub mod table;
pub mod telemetry;

/// Job type recorded for every cleaning run.
pub const JOB_TYPE: &str = "basic_cleaning";

/// Crate version, as published in the workspace manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use context::RunContext;
pub use error::{CleaningError, Result};
pub use obs::{
    emit_artifact_fetched, emit_artifact_logged, emit_cleaning_applied, emit_config_recorded,
    emit_run_finalize_error, emit_run_finished, emit_run_started, emit_table_loaded,
    emit_table_written, StepSpan,
};
pub use step::{CleaningStep, OutputSpec, StepConfig, StepOutput, DOWNLOAD_DIR};
pub use strategy::{CleaningStats, CleaningStrategy};
pub use table::{Cell, IndexColumn, Table};
pub use telemetry::{init_tracing, LogFormat};
