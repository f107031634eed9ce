use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage_traits::{ContentDigest, StorageResult};

use super::write_atomic;

/// Content-addressed blob directory with git-style 2-char sharding.
///
/// Layout: `<root>/objects/<first 2 hex chars>/<remaining hex chars>`
#[derive(Debug, Clone)]
pub struct BlobStore {
    objects_dir: PathBuf,
}

impl BlobStore {
    /// Open the blob directory under `root`, creating `root/objects/` if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let objects_dir = root.as_ref().join("objects");
        fs::create_dir_all(&objects_dir)?;
        Ok(Self { objects_dir })
    }

    fn blob_path(&self, digest: &ContentDigest) -> PathBuf {
        let hex = digest.as_str();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    /// Store `data` under `digest`. Existing blobs are left untouched.
    pub fn put(&self, digest: &ContentDigest, data: &[u8]) -> StorageResult<()> {
        let path = self.blob_path(digest);
        if path.exists() {
            return Ok(());
        }
        write_atomic(&path, data)
    }

    pub fn get(&self, digest: &ContentDigest) -> StorageResult<Vec<u8>> {
        let path = self.blob_path(digest);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::BlobNotFound {
                    digest: digest.to_string(),
                }
            } else {
                StorageError::Io(e)
            }
        })
    }

    pub fn exists(&self, digest: &ContentDigest) -> bool {
        self.blob_path(digest).exists()
    }
}
