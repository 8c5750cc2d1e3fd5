use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::contracts::{PersistedSequence, SequenceBackend, StorageError};

const STATE_FILE: &str = "job_sequence.json";

/// Single-file JSON backend.
///
/// Each persist writes a temp file, fsyncs it, renames it over the state
/// file and fsyncs the directory, so readers see either the old or the new
/// document.
pub struct FileBackend {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl FileBackend {
    /// Opens the backend in `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(STATE_FILE);
        let tmp_path = dir.join(format!("{}.tmp", STATE_FILE));

        // A leftover temp file is an interrupted persist; the state file
        // still holds the last acknowledged image.
        if tmp_path.exists() {
            tracing::warn!(path = %tmp_path.display(), "Removing incomplete sequence state write");
            fs::remove_file(&tmp_path)?;
        }

        Ok(Self { path, tmp_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sync_parent(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            File::open(parent)?.sync_all()?;
        }
        Ok(())
    }
}

impl SequenceBackend for FileBackend {
    fn load(&self) -> Result<Option<PersistedSequence>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)?;
        let image = serde_json::from_slice(&data)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(image))
    }

    fn persist(&self, state: &PersistedSequence) -> Result<(), StorageError> {
        let data =
            serde_json::to_vec(state).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut file = File::create(&self.tmp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.tmp_path, &self.path)?;
        self.sync_parent()
    }

    fn describe(&self) -> &'static str {
        "file"
    }
}
