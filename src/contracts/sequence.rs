use serde::Serialize;

use crate::contracts::error::SequenceError;

/// Outcome of a single identifier allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub id: u64,
    /// True when this allocation restarted the counter at the wrap floor.
    pub wrapped: bool,
}

/// Issues job sequence numbers.
///
/// # Invariants
/// - No two calls to `allocate_next` observe the same value within one
///   wrap cycle, including across process restarts.
/// - Every returned id satisfies `id <= max_sequence_value()` at the time
///   of allocation.
/// - An id is returned only after the state covering it is durable.
pub trait SequenceIssuer: Send + Sync {
    /// Allocates the next job sequence number.
    fn allocate_next(&self) -> Result<Allocation, SequenceError>;

    /// Returns the last issued value without advancing.
    fn current_value(&self) -> Result<u64, SequenceError>;
}
