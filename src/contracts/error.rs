use std::sync::{MutexGuard, PoisonError};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobSeqError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Extension trait for converting lock errors to StorageError.
pub trait LockResultExt<T> {
    /// Converts a lock error to a StorageError.
    fn map_lock_err(self) -> Result<T, StorageError>;
}

impl<'a, T> LockResultExt<MutexGuard<'a, T>>
    for Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>
{
    #[inline]
    fn map_lock_err(self) -> Result<MutexGuard<'a, T>, StorageError> {
        self.map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

/// Failures surfaced by the configuration gateway.
///
/// The display text of the first three variants is part of the management
/// protocol and must not change.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unauthorized Request")]
    Unauthorized,

    #[error("Illegal attribute or resource value")]
    MalformedValue,

    #[error("Cannot set max_job_sequence_id < 9999999, or > 999999999999")]
    OutOfRange,

    #[error("Failed to persist max_job_sequence_id: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum SequenceError {
    /// The durable write backing an allocation failed. Retryable.
    #[error("Job sequence allocation failed: {0}")]
    AllocationFailed(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDb(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt sequence state: {0}")]
    Corrupt(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}
