//! `basic_cleaning`: drop price outliers and normalize review dates.
//!
//! ```text
//! basic_cleaning --input_artifact sample.csv:latest \
//!     --output_artifact clean_sample.csv --output_type clean_sample \
//!     --output_description "Data with outliers removed" \
//!     --min_price 10 --max_price 350
//! ```

use anyhow::Result;
use clap::Parser;
use cleaning_cli::{execute, CommonArgs};
use cleaning_core::{CleaningStrategy, IndexColumn, OutputSpec, StepConfig};

#[derive(Debug, Parser)]
#[command(name = "basic_cleaning")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "This step cleans the data", long_about = None)]
struct Cli {
    /// Fully-qualified name for the input artifact
    #[arg(long = "input_artifact")]
    input_artifact: String,

    /// Name for the output artifact
    #[arg(long = "output_artifact")]
    output_artifact: String,

    /// Type for the output artifact
    #[arg(long = "output_type")]
    output_type: String,

    /// Description for the output artifact
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum price used to remove outliers
    #[arg(long = "min_price", allow_negative_numbers = true)]
    min_price: f64,

    /// Maximum price used to remove outliers
    #[arg(long = "max_price", allow_negative_numbers = true)]
    max_price: f64,

    #[command(flatten)]
    common: CommonArgs,
}

impl Cli {
    fn step_config(&self) -> StepConfig {
        StepConfig {
            input_artifact: self.input_artifact.clone(),
            output: OutputSpec {
                name: self.output_artifact.clone(),
                artifact_type: self.output_type.clone(),
                description: self.output_description.clone(),
            },
            strategy: CleaningStrategy::FilterNormalize {
                min_price: self.min_price,
                max_price: self.max_price,
            },
            index: IndexColumn::Omit,
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

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 13] = [
        "basic_cleaning",
        "--input_artifact",
        "sample.csv:latest",
        "--output_artifact",
        "clean_sample.csv",
        "--output_type",
        "clean_sample",
        "--output_description",
        "Data with outliers removed",
        "--min_price",
        "10",
        "--max_price",
        "350",
    ];

    #[test]
    fn parses_required_flags() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        let config = cli.step_config();
        assert_eq!(config.input_artifact, "sample.csv:latest");
        assert_eq!(config.output.name, "clean_sample.csv");
        assert_eq!(
            config.strategy,
            CleaningStrategy::FilterNormalize {
                min_price: 10.0,
                max_price: 350.0
            }
        );
        assert_eq!(config.index, IndexColumn::Omit);
        config.validate().unwrap();
    }

    #[test]
    fn missing_price_bound_is_rejected() {
        let args = &REQUIRED[..REQUIRED.len() - 2];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let mut args = REQUIRED;
        args[10] = "cheap";
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn negative_bounds_parse() {
        let mut args = REQUIRED;
        args[10] = "-5";
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.min_price, -5.0);
    }

    #[test]
    fn common_flags_override_defaults() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--store_dir",
            "/tmp/store",
            "--project",
            "nyc_airbnb",
            "--work_dir",
            "/tmp/work",
            "--json",
        ]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.common.store_dir, std::path::PathBuf::from("/tmp/store"));
        assert_eq!(cli.common.project, "nyc_airbnb");
        assert!(cli.common.json);
        assert_eq!(
            cli.step_config().work_dir,
            std::path::PathBuf::from("/tmp/work")
        );
    }
}
