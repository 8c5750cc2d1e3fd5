//! Authorization-gated configuration of `max_job_sequence_id`.
//!
//! Authorization always runs first: an unprivileged caller is refused
//! before its candidate is looked at, and nothing is logged or changed.

mod acl;

pub use acl::ManagerList;

use std::sync::Arc;

use crate::contracts::{CallerIdentity, ConfigError, PrivilegeCheck, SequenceBackend};
use crate::sequence::{validate_max_sequence, Candidate, MaxSequenceValue, SequenceStore};

pub struct ConfigGateway<B: SequenceBackend> {
    store: Arc<SequenceStore<B>>,
    privileges: Arc<dyn PrivilegeCheck>,
}

impl<B: SequenceBackend> ConfigGateway<B> {
    pub fn new(store: Arc<SequenceStore<B>>, privileges: Arc<dyn PrivilegeCheck>) -> Self {
        Self { store, privileges }
    }

    pub fn store(&self) -> &Arc<SequenceStore<B>> {
        &self.store
    }

    pub fn get_max_sequence_value(&self) -> Result<u64, ConfigError> {
        Ok(self.store.current_max()?.get())
    }

    /// Validates `candidate` and makes it the new maximum.
    pub fn set_max_sequence_value(
        &self,
        candidate: impl Into<Candidate>,
        caller: &CallerIdentity,
    ) -> Result<MaxSequenceValue, ConfigError> {
        self.observe(caller, "set", || {
            let value = validate_max_sequence(&candidate.into())?;
            self.store.apply_max(value)?;
            Ok(value)
        })
    }

    /// Restores the default maximum.
    pub fn unset_max_sequence_value(&self, caller: &CallerIdentity) -> Result<(), ConfigError> {
        self.observe(caller, "unset", || Ok(self.store.revert_to_default()?))
    }

    /// Rejects unprivileged callers, otherwise runs `apply` and keeps the
    /// metrics in step with the outcome.
    fn observe<T>(
        &self,
        caller: &CallerIdentity,
        operation: &'static str,
        apply: impl FnOnce() -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        let result = if self.privileges.is_privileged(caller) {
            apply()
        } else {
            Err(ConfigError::Unauthorized)
        };

        let metrics = self.store.metrics();
        match &result {
            Ok(_) => metrics.record_config_change(),
            Err(e) => {
                metrics.record_config_rejection(e);
                tracing::debug!(caller = %caller, operation, error = %e, "Rejected max_job_sequence_id request");
            }
        }
        result
    }
}
