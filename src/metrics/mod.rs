//! Observability metrics for the job sequence subsystem.
//!
//! Plain atomics so recording never contends with the sequence lock.

pub mod histogram;
pub mod registry;

pub use histogram::Histogram;
pub use registry::SequenceMetrics;
