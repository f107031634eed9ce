//! Filesystem backends.
//!
//! Layout under a store root:
//!
//! ```text
//! <root>/objects/<2 hex>/<62 hex>                  file contents, by digest
//! <root>/artifacts/<project>/<name>/v<N>.json      version manifests
//! <root>/artifacts/<project>/<name>/latest         alias pointer ("v<N>")
//! <root>/runs/<run_id>.json                        run records
//! ```

pub mod blobs;
pub mod ledger;
pub mod store;

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::storage_traits::StorageResult;

pub use blobs::BlobStore;
pub use ledger::FsRunLedger;
pub use store::FsArtifactStore;

/// Write `data` to `path` via a temp file in the same directory and a rename,
/// so readers never observe a partially written file.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> StorageResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
