// Native filesystem storage implementation for desktop
//
// Each key maps to one file in the data directory. Writes go to a sibling
// temp file first and are renamed into place, so a crash mid-write leaves the
// previous report list readable.

use super::{StorageBackend, StorageError};
use std::{
    ffi::OsString,
    io::ErrorKind,
    path::PathBuf,
};
use tracing::{debug, warn};

/// Suffix for in-flight writes.
const TEMP_SUFFIX: &str = ".tmp";

/// File-per-key storage backend for desktop platforms.
pub struct NativeStorage {
    dir: PathBuf,
}

impl NativeStorage {
    /// Creates a NativeStorage in `dir`, creating the directory if needed.
    pub fn with_path(dir: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir).map_err(|e| {
            StorageError::IoError(format!("Cannot create {}: {}", dir.display(), e))
        })?;

        Ok(Self { dir })
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        let mut name = OsString::from(key);
        name.push(TEMP_SUFFIX);
        self.dir.join(name)
    }
}

fn map_write_error(e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::StorageFull | ErrorKind::QuotaExceeded => StorageError::QuotaExceeded,
        _ => StorageError::IoError(format!("Cannot write reports: {}", e)),
    }
}

#[async_trait::async_trait(?Send)]
impl StorageBackend for NativeStorage {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.slot_path(key);
        let temp = self.temp_path(key);

        tokio::fs::write(&temp, data).await.map_err(map_write_error)?;
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                warn!("Could not remove {}: {}", temp.display(), cleanup);
            }
            return Err(StorageError::IoError(format!(
                "Cannot replace {}: {}",
                path.display(),
                e
            )));
        }

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.slot_path(key);
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::IoError(format!("Cannot read {}: {}", path.display(), e)),
        })
    }
}
