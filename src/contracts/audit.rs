use chrono::{DateTime, Utc};

/// Destination for server state-transition records.
pub trait AuditSink: Send + Sync {
    /// Records one message. Sinks must not fail the caller; a sink that
    /// cannot write reports the problem through `tracing`.
    fn record(&self, message: &str, timestamp: DateTime<Utc>);
}
