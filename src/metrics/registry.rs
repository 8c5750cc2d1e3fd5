//! Counters for the job sequence subsystem.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Histogram;
use crate::contracts::ConfigError;

/// All sequence metrics. Shared by the store, the gateway and the HTTP layer.
#[derive(Default)]
pub struct SequenceMetrics {
    /// Ids handed out
    pub allocations_total: AtomicU64,
    /// Allocations that restarted the counter at the floor
    pub wraps_total: AtomicU64,
    /// Allocations refused because the durable write failed
    pub allocation_failures_total: AtomicU64,
    /// Durable writes issued by the store
    pub persists_total: AtomicU64,
    /// Successful set/unset of the maximum
    pub config_changes_total: AtomicU64,
    pub rejected_unauthorized_total: AtomicU64,
    pub rejected_malformed_total: AtomicU64,
    pub rejected_out_of_range_total: AtomicU64,
    /// Durable write latency in microseconds
    pub persist_latency_us: Histogram,
}

impl SequenceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_allocation(&self, wrapped: bool) {
        self.allocations_total.fetch_add(1, Ordering::Relaxed);
        if wrapped {
            self.wraps_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_allocation_failure(&self) {
        self.allocation_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_persist(&self, latency_us: u64) {
        self.persists_total.fetch_add(1, Ordering::Relaxed);
        self.persist_latency_us.observe(latency_us);
    }

    #[inline]
    pub fn record_config_change(&self) {
        self.config_changes_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a rejected configuration request by kind.
    pub fn record_config_rejection(&self, error: &ConfigError) {
        let counter = match error {
            ConfigError::Unauthorized => &self.rejected_unauthorized_total,
            ConfigError::MalformedValue => &self.rejected_malformed_total,
            ConfigError::OutOfRange => &self.rejected_out_of_range_total,
            ConfigError::Storage(_) => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Formats all metrics in Prometheus exposition format.
    pub fn format_prometheus(&self) -> String {
        let mut output = String::with_capacity(4096);

        write_counter(
            &mut output,
            "jobseq_allocations_total",
            "Total job sequence ids allocated",
            &self.allocations_total,
        );
        write_counter(
            &mut output,
            "jobseq_wraps_total",
            "Total allocations that wrapped to the floor",
            &self.wraps_total,
        );
        write_counter(
            &mut output,
            "jobseq_allocation_failures_total",
            "Total allocations refused after a failed durable write",
            &self.allocation_failures_total,
        );
        write_counter(
            &mut output,
            "jobseq_persists_total",
            "Total durable writes of the sequence state",
            &self.persists_total,
        );
        write_counter(
            &mut output,
            "jobseq_config_changes_total",
            "Total successful max_job_sequence_id set/unset requests",
            &self.config_changes_total,
        );

        let _ = writeln!(
            output,
            "# HELP jobseq_config_rejections_total Rejected max_job_sequence_id requests by reason"
        );
        let _ = writeln!(output, "# TYPE jobseq_config_rejections_total counter");
        for (reason, counter) in [
            ("unauthorized", &self.rejected_unauthorized_total),
            ("malformed", &self.rejected_malformed_total),
            ("out_of_range", &self.rejected_out_of_range_total),
        ] {
            let _ = writeln!(
                output,
                "jobseq_config_rejections_total{{reason=\"{}\"}} {}",
                reason,
                counter.load(Ordering::Relaxed)
            );
        }
        output.push('\n');

        output.push_str(&self.persist_latency_us.format_prometheus(
            "jobseq_persist_latency_us",
            "Histogram of durable sequence write latency in microseconds",
        ));

        output
    }
}

fn write_counter(output: &mut String, name: &str, help: &str, value: &AtomicU64) {
    let _ = writeln!(output, "# HELP {} {}", name, help);
    let _ = writeln!(output, "# TYPE {} counter", name);
    let _ = writeln!(output, "{} {}", name, value.load(Ordering::Relaxed));
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_count_as_allocations() {
        let m = SequenceMetrics::new();
        m.record_allocation(false);
        m.record_allocation(true);
        assert_eq!(m.allocations_total.load(Ordering::Relaxed), 2);
        assert_eq!(m.wraps_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn rejections_are_split_by_reason() {
        let m = SequenceMetrics::new();
        m.record_config_rejection(&ConfigError::Unauthorized);
        m.record_config_rejection(&ConfigError::OutOfRange);
        m.record_config_rejection(&ConfigError::OutOfRange);

        let output = m.format_prometheus();
        assert!(output.contains("jobseq_config_rejections_total{reason=\"unauthorized\"} 1"));
        assert!(output.contains("jobseq_config_rejections_total{reason=\"out_of_range\"} 2"));
        assert!(output.contains("jobseq_config_rejections_total{reason=\"malformed\"} 0"));
    }

    #[test]
    fn persist_latency_is_exported() {
        let m = SequenceMetrics::new();
        m.record_persist(120);
        let output = m.format_prometheus();
        assert!(output.contains("jobseq_persists_total 1"));
        assert!(output.contains("jobseq_persist_latency_us_count 1"));
    }
}
