//! Audit sinks for server state transitions.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::contracts::{AuditSink, StorageError};

/// Emits records as `tracing` events on target `jobseq::audit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, message: &str, timestamp: DateTime<Utc>) {
        tracing::info!(
            target: "jobseq::audit",
            timestamp = %timestamp.to_rfc3339(),
            "{}",
            message
        );
    }
}

/// Appends scheduler-style server log lines to a file:
/// `MM/DD/YYYY HH:MM:SS;0004;Server@<name>;Svr;Server@<name>;<message>`.
pub struct FileAuditLog {
    path: PathBuf,
    server_name: String,
    file: Mutex<File>,
}

impl FileAuditLog {
    pub fn open(path: impl AsRef<Path>, server_name: impl Into<String>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            server_name: server_name.into(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_line(&self, message: &str, timestamp: DateTime<Utc>) -> String {
        format!(
            "{};0004;Server@{};Svr;Server@{};{}\n",
            timestamp.format("%m/%d/%Y %H:%M:%S"),
            self.server_name,
            self.server_name,
            message
        )
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, message: &str, timestamp: DateTime<Utc>) {
        let line = self.format_line(message, timestamp);
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|_| file.flush()) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to append audit record"
            );
        }
    }
}

/// One captured audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory sink, for tests and embedders that ship records elsewhere.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// True if any record contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.contains_since(needle, DateTime::<Utc>::MIN_UTC)
    }

    /// True if a record at or after `since` contains `needle`.
    pub fn contains_since(&self, needle: &str, since: DateTime<Utc>) -> bool {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|r| r.timestamp >= since && r.message.contains(needle))
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, message: &str, timestamp: DateTime<Utc>) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(AuditRecord {
                message: message.to_string(),
                timestamp,
            });
    }
}
