use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::contracts::{LockResultExt, PersistedSequence, SequenceBackend, StorageError};

/// Volatile backend. Clones share the same image, so a test can hand one
/// clone to a store and inspect or reopen from another.
///
/// Supports failure injection through [`MemoryBackend::fail_next_persists`].
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    image: Mutex<Option<PersistedSequence>>,
    persists: AtomicU64,
    failures_pending: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds `image`, as if restarted.
    pub fn with_image(image: PersistedSequence) -> Self {
        let backend = Self::new();
        if let Ok(mut slot) = backend.inner.image.lock() {
            *slot = Some(image);
        }
        backend
    }

    /// Makes the next `count` persists fail without touching the image.
    pub fn fail_next_persists(&self, count: usize) {
        self.inner.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Number of successful persists.
    pub fn persist_count(&self) -> u64 {
        self.inner.persists.load(Ordering::SeqCst)
    }

    /// Current durable image.
    pub fn image(&self) -> Option<PersistedSequence> {
        self.inner.image.lock().ok().and_then(|slot| *slot)
    }
}

impl SequenceBackend for MemoryBackend {
    fn load(&self) -> Result<Option<PersistedSequence>, StorageError> {
        Ok(*self.inner.image.lock().map_lock_err()?)
    }

    fn persist(&self, state: &PersistedSequence) -> Result<(), StorageError> {
        let injected = self
            .inner
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StorageError::Io("injected persist failure".into()));
        }

        *self.inner.image.lock().map_lock_err()? = Some(*state);
        self.inner.persists.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "memory"
    }
}
