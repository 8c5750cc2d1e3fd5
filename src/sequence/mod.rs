//! Job sequence issuance: the bound validator, the counter arithmetic and
//! the durable store that ties them together.

pub mod bound;
pub mod issuer;
mod store;

pub use bound::{
    validate_max_sequence, Candidate, MaxSequenceValue, DEFAULT_MAX_SEQUENCE_ID,
    MAX_MAX_SEQUENCE_ID, MIN_MAX_SEQUENCE_ID,
};
pub use issuer::{next_sequence, reservation_end, IssuerConfig, JobId};
pub use store::{SequenceSnapshot, SequenceStore};
