//! Storage trait definitions for basic-cleaning
//!
//! These traits define the two collaborators a pipeline step talks to:
//! - `ArtifactStore`: Versioned artifact storage (resolve/download/upload)
//! - `RunLedger`: Run record persistence (config snapshot, lineage, finalization)
//!
//! Both traits are synchronous and backend-agnostic. Filesystem backends live
//! in the `fs` module; in-memory fakes for testing live in `fakes`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::error::StorageError;
use crate::reference::{validate_segment, ArtifactRef};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Content digests
// ---------------------------------------------------------------------------

/// Content digest (SHA-256 hex string).
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl From<ContentDigest> for String {
    fn from(d: ContentDigest) -> Self {
        d.0
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ArtifactStore: Versioned Artifact Storage
// ---------------------------------------------------------------------------

/// One file inside a stored artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    /// File name (no directories)
    pub name: String,
    /// SHA-256 of the file contents
    pub digest: ContentDigest,
    /// Size in bytes
    pub size: u64,
}

/// An artifact that has been described and had files attached, but has not
/// been uploaded yet.
#[derive(Debug, Clone)]
pub struct ArtifactDraft {
    name: String,
    artifact_type: String,
    description: String,
    files: Vec<PathBuf>,
}

/// File contents read from a draft, ready to be written to a store.
#[derive(Debug)]
pub struct StagedFile {
    pub entry: ArtifactFile,
    pub bytes: Vec<u8>,
}

impl ArtifactDraft {
    /// Describe a new artifact. The name must be a valid reference segment.
    pub fn new(name: &str, artifact_type: &str, description: &str) -> StorageResult<Self> {
        validate_segment(name).map_err(|reason| StorageError::InvalidReference {
            reference: name.to_string(),
            reason,
        })?;
        Ok(Self {
            name: name.to_string(),
            artifact_type: artifact_type.to_string(),
            description: description.to_string(),
            files: Vec::new(),
        })
    }

    /// Attach a local file. The file must exist; its contents are read at
    /// upload time.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> StorageResult<()> {
        let path = path.into();
        let file_name = file_name_of(&path)?;
        if self.files.iter().any(|p| p.file_name() == path.file_name()) {
            return Err(StorageError::DuplicateFile {
                name: self.name.clone(),
                file: file_name,
            });
        }
        if !std::fs::metadata(&path)?.is_file() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )));
        }
        self.files.push(path);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Read every attached file and compute its digest.
    pub fn stage(&self) -> StorageResult<Vec<StagedFile>> {
        if self.files.is_empty() {
            return Err(StorageError::EmptyArtifact {
                name: self.name.clone(),
            });
        }
        self.files
            .iter()
            .map(|path| {
                let bytes = std::fs::read(path)?;
                Ok(StagedFile {
                    entry: ArtifactFile {
                        name: file_name_of(path)?,
                        digest: ContentDigest::from_bytes(&bytes),
                        size: bytes.len() as u64,
                    },
                    bytes,
                })
            })
            .collect()
    }
}

fn file_name_of(path: &Path) -> StorageResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no usable file name", path.display()),
            ))
        })
}

/// A stored, immutable artifact version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub project: String,
    pub name: String,
    pub version: u32,
    pub artifact_type: String,
    pub description: String,
    pub files: Vec<ArtifactFile>,
    /// Run that uploaded this version, if known
    pub produced_by: Option<RunId>,
    pub created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Whether this version holds exactly the staged files (same names and
    /// digests, same order).
    pub fn matches_staged(&self, staged: &[StagedFile]) -> bool {
        self.files.len() == staged.len()
            && self
                .files
                .iter()
                .zip(staged)
                .all(|(a, b)| a.name == b.entry.name && a.digest == b.entry.digest)
    }

    /// Build the record for the version following `latest` (or `v0`).
    pub fn next_version(
        project: &str,
        draft: &ArtifactDraft,
        staged: &[StagedFile],
        latest: Option<&ArtifactRecord>,
        producer: Option<&RunId>,
    ) -> Self {
        Self {
            project: project.to_string(),
            name: draft.name().to_string(),
            version: latest.map(|r| r.version + 1).unwrap_or(0),
            artifact_type: draft.artifact_type().to_string(),
            description: draft.description().to_string(),
            files: staged.iter().map(|s| s.entry.clone()).collect(),
            produced_by: producer.cloned(),
            created_at: Utc::now(),
        }
    }

    /// Pinned reference to this version.
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef::pinned(&self.project, &self.name, self.version)
    }

    /// The artifact's only file. Errors for multi-file artifacts.
    pub fn single_file(&self) -> StorageResult<&ArtifactFile> {
        match self.files.as_slice() {
            [file] => Ok(file),
            files => Err(StorageError::NotSingleFile {
                reference: self.reference().to_string(),
                count: files.len(),
            }),
        }
    }
}

/// A downloaded artifact: the resolved record plus the local file path.
#[derive(Debug, Clone)]
pub struct LocalArtifact {
    pub record: ArtifactRecord,
    pub path: PathBuf,
}

/// Versioned artifact store.
///
/// Guarantees:
/// - Versions of a name are numbered `v0, v1, ...` in upload order.
/// - `latest` resolves to the highest version.
/// - Stored versions are immutable; uploading content identical to `latest`
///   returns the existing record instead of a new version.
pub trait ArtifactStore: Send + Sync {
    /// Project used for references that do not name one.
    fn default_project(&self) -> &str;

    /// Resolve a reference to a stored version.
    /// Returns `StorageError::ArtifactNotFound` if no version matches.
    fn resolve(&self, reference: &ArtifactRef) -> StorageResult<ArtifactRecord>;

    /// Read raw file bytes by digest.
    fn read_blob(&self, digest: &ContentDigest) -> StorageResult<Vec<u8>>;

    /// Store the draft's files as a new version of its name.
    fn upload(
        &self,
        draft: &ArtifactDraft,
        producer: Option<&RunId>,
    ) -> StorageResult<ArtifactRecord>;

    /// Materialize a single-file artifact under `dest/<name>-v<N>/` and
    /// return the file path. Contents are verified against the recorded
    /// digest.
    fn download(&self, record: &ArtifactRecord, dest: &Path) -> StorageResult<PathBuf> {
        let file = record.single_file()?;
        let bytes = self.read_blob(&file.digest)?;
        let actual = ContentDigest::from_bytes(&bytes);
        if actual != file.digest {
            return Err(StorageError::DigestMismatch {
                file: file.name.clone(),
                expected: file.digest.to_string(),
                actual: actual.to_string(),
            });
        }

        let dir = dest.join(format!("{}-v{}", record.name, record.version));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(&file.name);
        std::fs::write(&path, &bytes)?;
        Ok(path)
    }

    /// Resolve `reference` and download its file into `dest`.
    fn resolve_and_download(
        &self,
        reference: &ArtifactRef,
        dest: &Path,
    ) -> StorageResult<LocalArtifact> {
        let record = self.resolve(reference)?;
        let path = self.download(&record, dest)?;
        tracing::debug!(
            reference = %record.reference(),
            path = %path.display(),
            "artifact downloaded"
        );
        Ok(LocalArtifact { record, path })
    }
}

// ---------------------------------------------------------------------------
// RunLedger: Run Record Persistence
// ---------------------------------------------------------------------------

/// Unique identifier for an execution run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random RunId
    pub fn new() -> Self {
        RunId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Summary produced when a run is finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Whether the run succeeded
    pub success: bool,
    /// Step-specific figures (row counts and the like)
    pub metrics: Value,
}

/// Full run record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    /// Kind of job this run executed (e.g. "basic_cleaning")
    pub job_type: String,
    pub status: RunStatus,
    /// Resolved parameters, merged across `record_config` calls
    pub config: Map<String, Value>,
    /// Input lineage, in first-use order
    pub used_artifacts: Vec<ArtifactRef>,
    /// Output lineage, in upload order
    pub logged_artifacts: Vec<ArtifactRef>,
    pub summary: Option<RunSummary>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    /// Fresh `Running` record.
    pub fn new(job_type: &str) -> Self {
        Self {
            run_id: RunId::new(),
            job_type: job_type.to_string(),
            status: RunStatus::Running,
            config: Map::new(),
            used_artifacts: Vec::new(),
            logged_artifacts: Vec::new(),
            summary: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn ensure_running(&self) -> StorageResult<()> {
        if self.status != RunStatus::Running {
            return Err(StorageError::InvalidRunState {
                run_id: self.run_id.0.clone(),
                status: format!("{:?}", self.status),
                expected: "Running".to_string(),
            });
        }
        Ok(())
    }

    /// Merge `config` into the snapshot; later keys overwrite earlier ones.
    pub fn merge_config(&mut self, config: Map<String, Value>) -> StorageResult<()> {
        self.ensure_running()?;
        self.config.extend(config);
        Ok(())
    }

    pub fn push_used(&mut self, reference: &ArtifactRef) -> StorageResult<()> {
        self.ensure_running()?;
        push_unique(&mut self.used_artifacts, reference);
        Ok(())
    }

    pub fn push_logged(&mut self, reference: &ArtifactRef) -> StorageResult<()> {
        self.ensure_running()?;
        push_unique(&mut self.logged_artifacts, reference);
        Ok(())
    }

    /// Transition to `Completed` or `Failed` depending on `summary.success`.
    pub fn finish(&mut self, summary: RunSummary) -> StorageResult<()> {
        self.ensure_running()?;
        self.status = if summary.success {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        self.summary = Some(summary);
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

fn push_unique(list: &mut Vec<ArtifactRef>, reference: &ArtifactRef) {
    if !list.contains(reference) {
        list.push(reference.clone());
    }
}

/// Run record ledger.
///
/// Guarantees:
/// - A run transitions: Running → Completed | Failed (terminal).
/// - Finalized runs are immutable; further writes fail with
///   `StorageError::InvalidRunState`.
pub trait RunLedger: Send + Sync {
    /// Create a new run, returning its unique ID.
    fn create_run(&self, job_type: &str) -> StorageResult<RunId>;

    /// Merge parameters into the run's configuration snapshot.
    fn record_config(&self, run_id: &RunId, config: Map<String, Value>) -> StorageResult<()>;

    /// Record that the run consumed `reference`.
    fn use_artifact(&self, run_id: &RunId, reference: &ArtifactRef) -> StorageResult<()>;

    /// Record that the run produced `reference`.
    fn log_artifact(&self, run_id: &RunId, reference: &ArtifactRef) -> StorageResult<()>;

    /// Finalize a run with a summary.
    fn finish_run(&self, run_id: &RunId, summary: RunSummary) -> StorageResult<()>;

    /// Retrieve a run record by ID.
    fn get_run(&self, run_id: &RunId) -> StorageResult<RunRecord>;
}
