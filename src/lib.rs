//! Job sequence identifier issuance for a batch scheduler daemon.
//!
//! Hands out unique job sequence numbers under an administrator-configurable
//! maximum (`max_job_sequence_id`), persists its position durably, and wraps
//! safely when the identifier space is exhausted.

pub mod api;
pub mod audit;
pub mod contracts;
pub mod gateway;
pub mod metrics;
pub mod sequence;
pub mod storage;
