use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use crate::contracts::{
    Allocation, AuditSink, LockResultExt, PersistedSequence, SequenceBackend, SequenceError,
    SequenceIssuer, StorageError,
};
use crate::metrics::SequenceMetrics;
use crate::sequence::bound::MaxSequenceValue;
use crate::sequence::issuer::{next_sequence, reservation_end, IssuerConfig};

/// In-memory view of the sequence configuration. Only reachable through
/// the store's lock.
#[derive(Debug, Clone, Copy)]
struct SequenceState {
    max: MaxSequenceValue,
    /// Last id handed out.
    issued: u64,
    /// Durable high-water mark, `issued <= reserved` within a cycle.
    reserved: u64,
}

impl SequenceState {
    fn image(&self) -> PersistedSequence {
        PersistedSequence {
            max_sequence_value: self.max.get(),
            current_value: self.reserved,
        }
    }
}

/// Point-in-time copy of the store's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceSnapshot {
    pub max_sequence_value: u64,
    pub current_value: u64,
    pub reserved_through: u64,
}

/// Durable owner of the job sequence counter and its configured maximum.
///
/// Allocation and reconfiguration serialize on one mutex. Every mutation
/// is persisted through the backend before it becomes visible; a failed
/// persist leaves the in-memory state exactly as it was.
pub struct SequenceStore<B: SequenceBackend> {
    backend: B,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<SequenceMetrics>,
    config: IssuerConfig,
    state: Mutex<SequenceState>,
}

impl<B: SequenceBackend> SequenceStore<B> {
    /// Opens the store, initializing the default configuration on first
    /// start. Issuance resumes after the persisted high-water mark.
    pub fn open(
        backend: B,
        audit: Arc<dyn AuditSink>,
        config: IssuerConfig,
    ) -> Result<Self, StorageError> {
        Self::open_with_metrics(backend, audit, config, Arc::new(SequenceMetrics::new()))
    }

    pub fn open_with_metrics(
        backend: B,
        audit: Arc<dyn AuditSink>,
        config: IssuerConfig,
        metrics: Arc<SequenceMetrics>,
    ) -> Result<Self, StorageError> {
        let config = config.sanitized();
        let image = match backend.load()? {
            Some(image) => image,
            None => {
                let image = PersistedSequence {
                    max_sequence_value: MaxSequenceValue::DEFAULT.get(),
                    current_value: 0,
                };
                backend.persist(&image)?;
                tracing::info!(
                    backend = backend.describe(),
                    max_sequence_value = image.max_sequence_value,
                    "Initialized job sequence state"
                );
                image
            }
        };

        let max = MaxSequenceValue::try_from(image.max_sequence_value).map_err(|_| {
            StorageError::Corrupt(format!(
                "persisted max_job_sequence_id {} is outside the permitted range",
                image.max_sequence_value
            ))
        })?;

        tracing::info!(
            backend = backend.describe(),
            max_sequence_value = max.get(),
            resume_after = image.current_value,
            reserve_batch = config.reserve_batch,
            wrap_floor = config.wrap_floor,
            "Job sequence store opened"
        );

        Ok(Self {
            backend,
            audit,
            metrics,
            config,
            state: Mutex::new(SequenceState {
                max,
                issued: image.current_value,
                reserved: image.current_value,
            }),
        })
    }

    pub fn metrics(&self) -> &Arc<SequenceMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Currently configured maximum.
    pub fn current_max(&self) -> Result<MaxSequenceValue, StorageError> {
        Ok(self.state.lock().map_lock_err()?.max)
    }

    pub fn snapshot(&self) -> Result<SequenceSnapshot, StorageError> {
        let state = self.state.lock().map_lock_err()?;
        Ok(SequenceSnapshot {
            max_sequence_value: state.max.get(),
            current_value: state.issued,
            reserved_through: state.reserved,
        })
    }

    /// Replaces the maximum, persists it, then records
    /// `svr_max_job_sequence_id set to val <v>`.
    pub fn apply_max(&self, value: MaxSequenceValue) -> Result<(), StorageError> {
        self.replace_max(
            value,
            format!("svr_max_job_sequence_id set to val {}", value.get()),
        )
    }

    /// Restores the default maximum, persists it, then records
    /// `svr_max_job_sequence_id reverting back to default val 9999999`.
    pub fn revert_to_default(&self) -> Result<(), StorageError> {
        let value = MaxSequenceValue::DEFAULT;
        self.replace_max(
            value,
            format!(
                "svr_max_job_sequence_id reverting back to default val {}",
                value.get()
            ),
        )
    }

    fn replace_max(&self, value: MaxSequenceValue, message: String) -> Result<(), StorageError> {
        let mut state = self.state.lock().map_lock_err()?;
        let next = SequenceState { max: value, ..*state };
        self.persist(&next.image())?;
        *state = next;

        // Recorded under the lock so the log order matches the apply order.
        self.audit.record(&message, Utc::now());
        tracing::info!(max_sequence_value = value.get(), "{}", message);
        Ok(())
    }

    fn persist(&self, image: &PersistedSequence) -> Result<(), StorageError> {
        let start = Instant::now();
        let result = self.backend.persist(image);
        if result.is_ok() {
            self.metrics
                .record_persist(start.elapsed().as_micros() as u64);
        }
        result
    }
}

impl<B: SequenceBackend> SequenceIssuer for SequenceStore<B> {
    fn allocate_next(&self) -> Result<Allocation, SequenceError> {
        let mut state = self
            .state
            .lock()
            .map_lock_err()
            .map_err(|e| SequenceError::AllocationFailed(e.to_string()))?;

        let (id, wrapped) = next_sequence(state.issued, state.max.get(), self.config.wrap_floor);

        // Ids inside the durable window need no I/O. A wrap always starts a
        // new window so a restart cannot resume in the previous cycle.
        if wrapped || id > state.reserved {
            let next = SequenceState {
                reserved: reservation_end(id, state.max.get(), self.config.reserve_batch),
                ..*state
            };
            if let Err(e) = self.persist(&next.image()) {
                self.metrics.record_allocation_failure();
                tracing::warn!(
                    candidate = id,
                    last_durable = state.reserved,
                    error = %e,
                    "Job sequence persist failed; allocation withdrawn"
                );
                return Err(SequenceError::AllocationFailed(e.to_string()));
            }
            state.reserved = next.reserved;
        }

        state.issued = id;
        self.metrics.record_allocation(wrapped);
        if wrapped {
            tracing::info!(
                id,
                max_sequence_value = state.max.get(),
                "Job sequence wrapped"
            );
        }
        Ok(Allocation { id, wrapped })
    }

    fn current_value(&self) -> Result<u64, SequenceError> {
        self.state
            .lock()
            .map(|state| state.issued)
            .map_err(|e| SequenceError::AllocationFailed(e.to_string()))
    }
}
