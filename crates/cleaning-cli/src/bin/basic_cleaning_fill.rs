//! `basic_cleaning_fill`: fill missing review fields with defaults.

use anyhow::Result;
use clap::Parser;
use cleaning_cli::{execute, CommonArgs};
use cleaning_core::{CleaningStrategy, IndexColumn, OutputSpec, StepConfig};

#[derive(Debug, Parser)]
#[command(name = "basic_cleaning_fill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fills missing review values and publishes the result", long_about = None)]
struct Cli {
    /// Fully-qualified name for the input artifact
    #[arg(long = "input_artifact")]
    input_artifact: String,

    /// Name for the output artifact
    #[arg(long = "artifact_name")]
    artifact_name: String,

    /// Type for the output artifact
    #[arg(long = "artifact_type")]
    artifact_type: String,

    /// Description for the output artifact
    #[arg(long = "artifact_description")]
    artifact_description: String,

    /// Write a leading row-index column
    #[arg(long = "write_index")]
    write_index: bool,

    #[command(flatten)]
    common: CommonArgs,
}

impl Cli {
    fn step_config(&self) -> StepConfig {
        StepConfig {
            input_artifact: self.input_artifact.clone(),
            output: OutputSpec {
                name: self.artifact_name.clone(),
                artifact_type: self.artifact_type.clone(),
                description: self.artifact_description.clone(),
            },
            strategy: CleaningStrategy::NullFill,
            index: if self.write_index {
                IndexColumn::Write
            } else {
                IndexColumn::Omit
            },
            work_dir: self.common.work_dir.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.common.init_tracing();

    let reference = execute(&cli.common, cli.step_config())?;
    println!("{reference}");
    Ok(())
}
