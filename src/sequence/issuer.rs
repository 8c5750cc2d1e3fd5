//! Counter arithmetic for job sequence issuance.
//!
//! The functions here decide what the next id is and how far ahead the
//! durable reservation reaches. The store applies them under its lock.

use std::fmt;

use serde::Serialize;

use crate::sequence::bound::MIN_MAX_SEQUENCE_ID;

/// Tuning for the issuer.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// How many ids one durable write reserves. `1` persists every
    /// allocation individually.
    pub reserve_batch: u64,
    /// First id handed out after a wrap.
    pub wrap_floor: u64,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            reserve_batch: 1,
            wrap_floor: 1,
        }
    }
}

impl IssuerConfig {
    /// Creates a config from environment variables.
    ///
    /// Reads:
    /// - `JOBSEQ_RESERVE_BATCH`: ids reserved per durable write (default: 1)
    /// - `JOBSEQ_WRAP_FLOOR`: first id after a wrap (default: 1)
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            reserve_batch: std::env::var("JOBSEQ_RESERVE_BATCH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.reserve_batch),
            wrap_floor: std::env::var("JOBSEQ_WRAP_FLOOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.wrap_floor),
        }
        .sanitized()
    }

    /// Clamps fields into their permitted ranges. The floor may not exceed
    /// the lowest configurable maximum, otherwise a wrap could land above
    /// the bound.
    pub fn sanitized(self) -> Self {
        Self {
            reserve_batch: self.reserve_batch.max(1),
            wrap_floor: self.wrap_floor.min(MIN_MAX_SEQUENCE_ID),
        }
    }
}

/// Returns the id that follows `issued` under `max`, and whether the
/// counter wrapped to reach it.
///
/// A maximum lowered below `issued` wraps immediately.
pub fn next_sequence(issued: u64, max: u64, floor: u64) -> (u64, bool) {
    match issued.checked_add(1) {
        Some(next) if next <= max => (next, false),
        _ => (floor, true),
    }
}

/// End of the durable window starting at `next`. Never reaches past `max`.
pub fn reservation_end(next: u64, max: u64, batch: u64) -> u64 {
    next.saturating_add(batch.max(1) - 1).min(max).max(next)
}

/// Externally visible job identifier, `<sequence>.<server>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobId {
    pub sequence: u64,
    pub server: String,
}

impl JobId {
    pub fn new(sequence: u64, server: impl Into<String>) -> Self {
        Self {
            sequence,
            server: server.into(),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.sequence, self.server)
    }
}
