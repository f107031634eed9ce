//! Error taxonomy for the cleaning step.

use std::path::PathBuf;

use artifact_ledger::StorageError;

/// Cleaning step errors. None of them are retried; all of them abort the
/// step and surface at the process boundary.
#[derive(Debug, thiserror::Error)]
pub enum CleaningError {
    /// A parameter is missing or out of range. Raised before any I/O.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The input artifact could not be located or downloaded.
    #[error("could not resolve input artifact {reference}: {source}")]
    Resolution {
        reference: String,
        #[source]
        source: StorageError,
    },

    /// The downloaded file is not parseable as delimited tabular data.
    #[error("could not load {} as tabular data: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// The cleaned table could not be written to the local file.
    #[error("could not write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// The output artifact could not be registered or uploaded.
    #[error("could not publish artifact {name}: {source}")]
    Publish {
        name: String,
        #[source]
        source: StorageError,
    },

    /// The run record could not be updated.
    #[error("run ledger error: {0}")]
    Ledger(#[from] StorageError),
}

/// Result type for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_names_reference() {
        let err = CleaningError::Resolution {
            reference: "sample.csv:latest".to_string(),
            source: StorageError::ArtifactNotFound {
                reference: "default/sample.csv:latest".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("could not resolve input artifact"));
        assert!(msg.contains("sample.csv:latest"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_load_error_names_path() {
        let err = CleaningError::Load {
            path: PathBuf::from("artifacts/sample.csv-v0/sample.csv"),
            reason: "found record with 3 fields, but the previous record has 2 fields".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sample.csv-v0/sample.csv"));
        assert!(msg.contains("3 fields"));
    }

    #[test]
    fn test_config_error() {
        let err = CleaningError::Config("min_price must not exceed max_price".to_string());
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
