use serde::{Deserialize, Serialize};

use crate::contracts::error::StorageError;

/// The durable image of the sequence configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSequence {
    pub max_sequence_value: u64,
    /// Durable high-water mark. Every id handed out in the current cycle is
    /// at or below this value.
    pub current_value: u64,
}

/// Durable storage for the sequence configuration.
///
/// # Invariants
/// - `persist` is atomic: after a crash, `load` returns either the previous
///   image or the new one, never a mix of both.
/// - `persist` returns only once the image is durable.
pub trait SequenceBackend: Send + Sync {
    /// Loads the persisted image, or `None` on first start.
    fn load(&self) -> Result<Option<PersistedSequence>, StorageError>;

    /// Atomically replaces the persisted image.
    fn persist(&self, state: &PersistedSequence) -> Result<(), StorageError>;

    /// Short label for logs and stats.
    fn describe(&self) -> &'static str;
}

impl<B: SequenceBackend + ?Sized> SequenceBackend for Box<B> {
    fn load(&self) -> Result<Option<PersistedSequence>, StorageError> {
        (**self).load()
    }

    fn persist(&self, state: &PersistedSequence) -> Result<(), StorageError> {
        (**self).persist(state)
    }

    fn describe(&self) -> &'static str {
        (**self).describe()
    }
}
