pub mod audit;
pub mod auth;
pub mod error;
pub mod sequence;
pub mod storage;

pub use audit::AuditSink;
pub use auth::{CallerIdentity, PrivilegeCheck};
pub use error::{ConfigError, JobSeqError, LockResultExt, SequenceError, StorageError};
pub use sequence::{Allocation, SequenceIssuer};
pub use storage::{PersistedSequence, SequenceBackend};
