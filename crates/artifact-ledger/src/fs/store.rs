use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::StorageError;
use crate::reference::{validate_segment, ArtifactAlias, ArtifactRef};
use crate::storage_traits::{
    ArtifactDraft, ArtifactRecord, ArtifactStore, ContentDigest, RunId, StorageResult,
};

use super::{write_atomic, BlobStore};

const LATEST_POINTER: &str = "latest";

/// Artifact store on the local filesystem.
///
/// File contents are deduplicated in a [`BlobStore`]; each version of a name
/// is a JSON manifest next to a `latest` pointer file.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    blobs: BlobStore,
    artifacts_dir: PathBuf,
    project: String,
}

impl FsArtifactStore {
    /// Open (or create) a store rooted at `root`. References without a
    /// project resolve in `project`, and uploads land there.
    pub fn open(root: impl AsRef<Path>, project: &str) -> StorageResult<Self> {
        for segment in project.split('/') {
            validate_segment(segment).map_err(|reason| StorageError::InvalidReference {
                reference: project.to_string(),
                reason,
            })?;
        }
        let root = root.as_ref();
        let artifacts_dir = root.join("artifacts");
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self {
            blobs: BlobStore::new(root)?,
            artifacts_dir,
            project: project.to_string(),
        })
    }

    fn name_dir(&self, project: &str, name: &str) -> PathBuf {
        self.artifacts_dir.join(project).join(name)
    }

    fn latest_version(&self, dir: &Path) -> StorageResult<Option<u32>> {
        match fs::read_to_string(dir.join(LATEST_POINTER)) {
            Ok(pointer) => match pointer.trim().parse::<ArtifactAlias>() {
                Ok(ArtifactAlias::Version(v)) => Ok(Some(v)),
                _ => Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("corrupt latest pointer in {}", dir.display()),
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn read_manifest(&self, dir: &Path, version: u32) -> StorageResult<Option<ArtifactRecord>> {
        match fs::read(dir.join(format!("v{version}.json"))) {
            Ok(json) => Ok(Some(serde_json::from_slice(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn default_project(&self) -> &str {
        &self.project
    }

    fn resolve(&self, reference: &ArtifactRef) -> StorageResult<ArtifactRecord> {
        let project = reference.project_or(&self.project);
        let dir = self.name_dir(project, reference.name());
        let not_found = || StorageError::ArtifactNotFound {
            reference: format!("{}/{}:{}", project, reference.name(), reference.alias()),
        };

        let version = match reference.alias() {
            ArtifactAlias::Latest => self.latest_version(&dir)?.ok_or_else(not_found)?,
            ArtifactAlias::Version(v) => v,
        };
        self.read_manifest(&dir, version)?.ok_or_else(not_found)
    }

    fn read_blob(&self, digest: &ContentDigest) -> StorageResult<Vec<u8>> {
        self.blobs.get(digest)
    }

    fn upload(
        &self,
        draft: &ArtifactDraft,
        producer: Option<&RunId>,
    ) -> StorageResult<ArtifactRecord> {
        let staged = draft.stage()?;
        let dir = self.name_dir(&self.project, draft.name());
        let latest = match self.latest_version(&dir)? {
            Some(v) => self.read_manifest(&dir, v)?,
            None => None,
        };

        if let Some(current) = latest.as_ref().filter(|l| l.matches_staged(&staged)) {
            info!(
                event = "artifact.unchanged",
                reference = %current.reference(),
                "upload matches latest version"
            );
            return Ok(current.clone());
        }
        let record =
            ArtifactRecord::next_version(&self.project, draft, &staged, latest.as_ref(), producer);

        for file in &staged {
            self.blobs.put(&file.entry.digest, &file.bytes)?;
        }
        let manifest = serde_json::to_vec_pretty(&record)?;
        write_atomic(&dir.join(format!("v{}.json", record.version)), &manifest)?;
        write_atomic(
            &dir.join(LATEST_POINTER),
            format!("v{}", record.version).as_bytes(),
        )?;

        info!(
            event = "artifact.uploaded",
            reference = %record.reference(),
            files = record.files.len(),
        );
        Ok(record)
    }
}
