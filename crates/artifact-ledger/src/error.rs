//! Error types for artifact-ledger

use thiserror::Error;

/// Errors raised by [`ArtifactStore`](crate::ArtifactStore) and
/// [`RunLedger`](crate::RunLedger) implementations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No artifact version matches the reference
    #[error("artifact not found: {reference}")]
    ArtifactNotFound { reference: String },

    /// Reference string could not be parsed
    #[error("invalid artifact reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Manifest points at a blob that is missing from the object store
    #[error("blob not found: {digest}")]
    BlobNotFound { digest: String },

    /// Digest string is not 64 hex characters
    #[error("invalid digest: {digest}")]
    InvalidDigest { digest: String },

    /// Downloaded bytes do not hash to the recorded digest
    #[error("digest mismatch for {file}: expected {expected}, got {actual}")]
    DigestMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// Caller asked for the single file of a multi-file (or empty) artifact
    #[error("artifact {reference} holds {count} files, expected exactly one")]
    NotSingleFile { reference: String, count: usize },

    /// Upload attempted without any attached file
    #[error("artifact {name} has no files attached")]
    EmptyArtifact { name: String },

    /// Two attached files share a file name
    #[error("artifact {name} already has a file named {file}")]
    DuplicateFile { name: String, file: String },

    /// Run ID is unknown to the ledger
    #[error("run not found: {run_id}")]
    RunNotFound { run_id: String },

    /// Run is not in the state required by the operation
    #[error("run {run_id} is {status}, expected {expected}")]
    InvalidRunState {
        run_id: String,
        status: String,
        expected: String,
    },

    /// Manifest or run record (de)serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether the error means the requested artifact does not exist, as
    /// opposed to the store being unreadable.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ArtifactNotFound { .. } | StorageError::BlobNotFound { .. }
        )
    }
}
