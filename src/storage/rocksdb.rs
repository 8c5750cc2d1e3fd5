use std::path::Path;

use rocksdb::{Options, WriteBatch, WriteOptions, DB};

use crate::contracts::{PersistedSequence, SequenceBackend, StorageError};

/// Key holding the configured maximum.
const MAX_KEY: &str = "svr:max_job_sequence_id";
/// Key holding the durable high-water mark of issued ids.
const CURRENT_KEY: &str = "svr:job_sequence_current";

/// RocksDB-backed sequence state.
///
/// Both keys go out in one `WriteBatch` with a synced WAL write, so an image
/// is either fully applied or absent after a crash.
pub struct RocksDbBackend {
    db: DB,
}

impl RocksDbBackend {
    /// Opens or creates the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        // Two tiny keys; keep the footprint small.
        opts.set_write_buffer_size(4 * 1024 * 1024);
        opts.set_max_write_buffer_number(2);
        opts.set_keep_log_file_num(4);

        let db = DB::open(&opts, path).map_err(|e| StorageError::RocksDb(e.to_string()))?;
        tracing::debug!(path = %path.display(), "Opened RocksDB sequence state");
        Ok(Self { db })
    }

    fn write_options() -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        opts
    }

    fn parse_u64_be(bytes: &[u8]) -> Result<u64, StorageError> {
        let arr: [u8; 8] = bytes.try_into().map_err(|_| {
            StorageError::Corrupt(format!("expected 8 bytes, found {}", bytes.len()))
        })?;
        Ok(u64::from_be_bytes(arr))
    }

    fn get_u64(&self, key: &str) -> Result<Option<u64>, StorageError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(bytes)) => Ok(Some(Self::parse_u64_be(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StorageError::RocksDb(e.to_string())),
        }
    }
}

impl SequenceBackend for RocksDbBackend {
    fn load(&self) -> Result<Option<PersistedSequence>, StorageError> {
        match (self.get_u64(MAX_KEY)?, self.get_u64(CURRENT_KEY)?) {
            (Some(max_sequence_value), Some(current_value)) => Ok(Some(PersistedSequence {
                max_sequence_value,
                current_value,
            })),
            (None, None) => Ok(None),
            // Batches write both keys together; one without the other
            // means the database was modified outside this backend.
            _ => Err(StorageError::Corrupt(
                "sequence state is missing one of its keys".into(),
            )),
        }
    }

    fn persist(&self, state: &PersistedSequence) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();
        batch.put(MAX_KEY.as_bytes(), state.max_sequence_value.to_be_bytes());
        batch.put(CURRENT_KEY.as_bytes(), state.current_value.to_be_bytes());
        self.db
            .write_opt(batch, &Self::write_options())
            .map_err(|e| StorageError::RocksDb(e.to_string()))
    }

    fn describe(&self) -> &'static str {
        "rocksdb"
    }
}
