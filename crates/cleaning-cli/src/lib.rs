//! Shared plumbing for the `basic_cleaning` binaries.
//!
//! Each binary parses its own step flags and flattens [`CommonArgs`] for the
//! store location, project, work directory and logging options.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use artifact_ledger::{ArtifactRef, FsArtifactStore, FsRunLedger};
use clap::Args;
use cleaning_core::{CleaningStep, LogFormat, RunContext, StepConfig, JOB_TYPE};
use tracing::{info, Level};

/// Flags shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Root of the artifact store and run ledger
    #[arg(
        long = "store_dir",
        env = "CLEANING_STORE_DIR",
        default_value = ".artifacts"
    )]
    pub store_dir: PathBuf,

    /// Project namespace for references that do not name one
    #[arg(long, env = "CLEANING_PROJECT", default_value = "default")]
    pub project: String,

    /// Directory for the cleaned CSV file and downloaded inputs
    #[arg(long = "work_dir", default_value = ".")]
    pub work_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl CommonArgs {
    /// Install the global tracing subscriber.
    pub fn init_tracing(&self) {
        let level = if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        };
        cleaning_core::init_tracing(LogFormat::from_json_flag(self.json), level);
    }
}

/// Run one cleaning step against the filesystem store under
/// `common.store_dir` and return the published reference.
///
/// The configuration is validated before a run is created, so an invalid
/// parameter leaves no trace in the ledger.
pub fn execute(common: &CommonArgs, config: StepConfig) -> Result<ArtifactRef> {
    let store = FsArtifactStore::open(&common.store_dir, &common.project).with_context(|| {
        format!(
            "Failed to open artifact store at {}",
            common.store_dir.display()
        )
    })?;
    let ledger = FsRunLedger::open(&common.store_dir).with_context(|| {
        format!("Failed to open run ledger at {}", common.store_dir.display())
    })?;

    let step = CleaningStep::new(Arc::new(store), config).context("Invalid step configuration")?;
    std::fs::create_dir_all(&step.config().work_dir).with_context(|| {
        format!(
            "Failed to create work directory {}",
            step.config().work_dir.display()
        )
    })?;

    let mut ctx = RunContext::init(Arc::new(ledger), JOB_TYPE).context("Failed to start run")?;
    let run_id = ctx.run_id().to_string();
    let output = step
        .run(&mut ctx)
        .with_context(|| format!("Cleaning run {run_id} failed"))?;
    ctx.finish()
        .with_context(|| format!("Failed to finalize run {run_id}"))?;

    info!(
        run_id = %run_id,
        input = %output.input,
        output = %output.artifact,
        local_file = %output.local_file.display(),
        "cleaning step complete"
    );
    Ok(output.artifact)
}
