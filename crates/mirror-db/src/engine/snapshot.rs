//! Snapshot persistence for on-disk stores
//!
//! The whole table state is serialized to one JSON file. Writes go through a
//! temp file and an atomic rename, so a crash mid-persist leaves the previous
//! snapshot intact.

use std::fs;
use std::path::Path;

use mirror_core::{StoreError, StoreResult};

use super::tables::Tables;

/// Load the snapshot, or an empty store if the file does not exist yet
pub(crate) fn load(path: &Path) -> StoreResult<Tables> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Storage(format!("snapshot decode failed: {e}"))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Tables::default()),
        Err(e) => Err(StoreError::Storage(format!("snapshot read failed: {e}"))),
    }
}

/// Persist the snapshot atomically
pub(crate) fn persist(path: &Path, tables: &Tables) -> StoreResult<()> {
    let bytes = serde_json::to_vec(tables)
        .map_err(|e| StoreError::Storage(format!("snapshot encode failed: {e}")))?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)
        .map_err(|e| StoreError::Storage(format!("snapshot write failed: {e}")))?;
    fs::rename(&tmp, path)
        .map_err(|e| StoreError::Storage(format!("snapshot rename failed: {e}")))?;

    tracing::trace!(path = %path.display(), bytes = bytes.len(), "Persisted snapshot");
    Ok(())
}
