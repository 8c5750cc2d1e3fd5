mod file;
mod memory;
mod rocksdb;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use rocksdb::RocksDbBackend;

use std::path::Path;

use crate::contracts::{SequenceBackend, StorageError};

/// Which durable backend the daemon uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    RocksDb,
    File,
}

impl BackendKind {
    /// Reads `JOBSEQ_BACKEND` (`rocksdb` or `file`, default: rocksdb).
    pub fn from_env() -> Self {
        match std::env::var("JOBSEQ_BACKEND") {
            Ok(v) if v.eq_ignore_ascii_case("file") => BackendKind::File,
            _ => BackendKind::RocksDb,
        }
    }

    /// Opens the selected backend under `data_dir`.
    pub fn open(
        self,
        data_dir: impl AsRef<Path>,
    ) -> Result<Box<dyn SequenceBackend>, StorageError> {
        let data_dir = data_dir.as_ref();
        let backend: Box<dyn SequenceBackend> = match self {
            BackendKind::RocksDb => Box::new(RocksDbBackend::open(data_dir.join("rocksdb"))?),
            BackendKind::File => Box::new(FileBackend::open(data_dir)?),
        };
        Ok(backend)
    }
}
