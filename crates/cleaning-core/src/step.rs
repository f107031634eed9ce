//! The cleaning step driver.
//!
//! One linear pipeline shared by every [`CleaningStrategy`]:
//! fetch input artifact → load table → apply strategy → write CSV →
//! upload output artifact → record lineage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use artifact_ledger::{ArtifactDraft, ArtifactRef, ArtifactStore};
use serde_json::{json, Map, Value};

use crate::context::RunContext;
use crate::error::{CleaningError, Result};
use crate::obs;
use crate::strategy::{CleaningStats, CleaningStrategy};
use crate::table::{IndexColumn, Table};

/// Subdirectory of the work dir that input artifacts are downloaded into.
pub const DOWNLOAD_DIR: &str = "artifacts";

/// Name, type and description of the artifact the step publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub name: String,
    pub artifact_type: String,
    pub description: String,
}

/// Everything one step execution needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StepConfig {
    /// Fully-qualified reference of the input artifact
    pub input_artifact: String,
    pub output: OutputSpec,
    pub strategy: CleaningStrategy,
    /// Leading index column in the written file (null-fill only)
    pub index: IndexColumn,
    /// Directory for the local CSV file and downloaded inputs
    pub work_dir: PathBuf,
}

impl StepConfig {
    /// Check the configuration before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("input_artifact", &self.input_artifact),
            ("output name", &self.output.name),
            ("output type", &self.output.artifact_type),
            ("output description", &self.output.description),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CleaningError::Config(format!("{field} must not be empty")));
            }
        }
        self.input_reference()?;
        ArtifactDraft::new(
            &self.output.name,
            &self.output.artifact_type,
            &self.output.description,
        )
        .map_err(|e| CleaningError::Config(e.to_string()))?;
        self.strategy.validate()?;

        if matches!(self.strategy, CleaningStrategy::FilterNormalize { .. })
            && self.index == IndexColumn::Write
        {
            return Err(CleaningError::Config(
                "the filter_normalize strategy never writes an index column".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed input reference.
    pub fn input_reference(&self) -> Result<ArtifactRef> {
        self.input_artifact
            .parse()
            .map_err(|e: artifact_ledger::StorageError| CleaningError::Config(e.to_string()))
    }

    /// Path of the intermediate CSV file.
    pub fn local_file(&self) -> PathBuf {
        self.work_dir.join(&self.output.name)
    }

    /// Parameter snapshot recorded against the run.
    pub fn to_config_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("input_artifact".into(), json!(self.input_artifact));
        map.insert("output_artifact".into(), json!(self.output.name));
        map.insert("output_type".into(), json!(self.output.artifact_type));
        map.insert("output_description".into(), json!(self.output.description));
        if let Ok(Value::Object(strategy)) = serde_json::to_value(self.strategy) {
            map.extend(strategy);
        }
        map.insert(
            "write_index".into(),
            json!(self.index == IndexColumn::Write),
        );
        map
    }
}

/// Result of a successful step.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Pinned reference of the input version that was cleaned
    pub input: ArtifactRef,
    /// Pinned reference of the published version
    pub artifact: ArtifactRef,
    /// The intermediate CSV file, left on disk
    pub local_file: PathBuf,
    pub stats: CleaningStats,
}

/// The cleaning step, bound to an artifact store and a validated config.
pub struct CleaningStep {
    store: Arc<dyn ArtifactStore>,
    config: StepConfig,
}

impl CleaningStep {
    /// Validate `config` and bind it to `store`.
    pub fn new(store: Arc<dyn ArtifactStore>, config: StepConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// Execute the step against `ctx`. Does not finalize the run.
    pub fn run(&self, ctx: &mut RunContext) -> Result<StepOutput> {
        let _span = obs::StepSpan::enter(&ctx.run_id().to_string(), ctx.job_type());
        ctx.record_config(self.config.to_config_map())?;

        let (input, input_path) = self.fetch_input(ctx)?;

        let mut table = Table::from_path(&input_path)?;
        obs::emit_table_loaded(table.len(), table.columns().len());

        let stats = self.config.strategy.apply(&mut table);
        obs::emit_cleaning_applied(self.config.strategy.name(), &stats);

        let local_file = self.config.local_file();
        table.write_path(&local_file, self.config.index)?;
        obs::emit_table_written(&local_file, table.len());

        let artifact = self.publish(ctx, &local_file)?;

        ctx.record_metric("rows_in", stats.rows_in);
        ctx.record_metric("rows_out", stats.rows_out);
        ctx.record_metric("dates_normalized", stats.dates_normalized);
        ctx.record_metric("dates_nulled", stats.dates_nulled);
        ctx.record_metric("cells_filled", stats.cells_filled);

        Ok(StepOutput {
            input,
            artifact,
            local_file,
            stats,
        })
    }

    fn fetch_input(&self, ctx: &mut RunContext) -> Result<(ArtifactRef, PathBuf)> {
        let reference = self.config.input_reference()?;
        let download_dir = self.config.work_dir.join(DOWNLOAD_DIR);
        let local = self
            .store
            .resolve_and_download(&reference, &download_dir)
            .map_err(|source| CleaningError::Resolution {
                reference: self.config.input_artifact.clone(),
                source,
            })?;

        let pinned = local.record.reference();
        ctx.use_artifact(&pinned)?;
        obs::emit_artifact_fetched(&self.config.input_artifact, &local.path);
        Ok((pinned, local.path))
    }

    fn publish(&self, ctx: &mut RunContext, local_file: &Path) -> Result<ArtifactRef> {
        let output = &self.config.output;
        let publish_err = |source| CleaningError::Publish {
            name: output.name.clone(),
            source,
        };

        let mut draft = ArtifactDraft::new(&output.name, &output.artifact_type, &output.description)
            .map_err(publish_err)?;
        draft.add_file(local_file).map_err(publish_err)?;
        let record = self
            .store
            .upload(&draft, Some(ctx.run_id()))
            .map_err(publish_err)?;

        let reference = record.reference();
        ctx.log_artifact(&reference)?;
        obs::emit_artifact_logged(&reference.to_string());
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(strategy: CleaningStrategy) -> StepConfig {
        StepConfig {
            input_artifact: "sample.csv:latest".to_string(),
            output: OutputSpec {
                name: "clean_sample.csv".to_string(),
                artifact_type: "clean_sample".to_string(),
                description: "Data with outliers removed".to_string(),
            },
            strategy,
            index: IndexColumn::Omit,
            work_dir: PathBuf::from("."),
        }
    }

    #[test]
    fn validate_accepts_both_strategies() {
        config(CleaningStrategy::NullFill).validate().unwrap();
        config(CleaningStrategy::filter_normalize(10.0, 350.0).unwrap())
            .validate()
            .unwrap();
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let mut cfg = config(CleaningStrategy::NullFill);
        cfg.output.description = "  ".to_string();
        assert!(matches!(cfg.validate(), Err(CleaningError::Config(_))));

        let mut cfg = config(CleaningStrategy::NullFill);
        cfg.input_artifact = String::new();
        assert!(matches!(cfg.validate(), Err(CleaningError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_names() {
        let mut cfg = config(CleaningStrategy::NullFill);
        cfg.input_artifact = "sample.csv:yesterday".to_string();
        assert!(matches!(cfg.validate(), Err(CleaningError::Config(_))));

        let mut cfg = config(CleaningStrategy::NullFill);
        cfg.output.name = "../clean.csv".to_string();
        assert!(matches!(cfg.validate(), Err(CleaningError::Config(_))));
    }

    #[test]
    fn validate_rejects_index_for_filter() {
        let mut cfg = config(CleaningStrategy::filter_normalize(10.0, 350.0).unwrap());
        cfg.index = IndexColumn::Write;
        assert!(matches!(cfg.validate(), Err(CleaningError::Config(_))));

        let mut cfg = config(CleaningStrategy::NullFill);
        cfg.index = IndexColumn::Write;
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let cfg = config(CleaningStrategy::FilterNormalize {
            min_price: 500.0,
            max_price: 10.0,
        });
        assert!(matches!(cfg.validate(), Err(CleaningError::Config(_))));
    }

    #[test]
    fn config_map_mirrors_parameters() {
        let map = config(CleaningStrategy::filter_normalize(10.0, 350.0).unwrap()).to_config_map();
        assert_eq!(map["input_artifact"], json!("sample.csv:latest"));
        assert_eq!(map["output_artifact"], json!("clean_sample.csv"));
        assert_eq!(map["strategy"], json!("filter_normalize"));
        assert_eq!(map["min_price"], json!(10.0));
        assert_eq!(map["max_price"], json!(350.0));
        assert_eq!(map["write_index"], json!(false));
    }

    #[test]
    fn local_file_is_named_after_output() {
        let mut cfg = config(CleaningStrategy::NullFill);
        cfg.work_dir = PathBuf::from("/tmp/work");
        assert_eq!(cfg.local_file(), PathBuf::from("/tmp/work/clean_sample.csv"));
    }
}
