//! Set/unset behaviour of the `max_job_sequence_id` server attribute.
//!
//! Run with: cargo test --test gateway_tests

use std::sync::Arc;

use chrono::Utc;
use jobseq::audit::MemoryAuditLog;
use jobseq::contracts::{CallerIdentity, ConfigError};
use jobseq::gateway::{ConfigGateway, ManagerList};
use jobseq::sequence::{Candidate, IssuerConfig, SequenceStore};
use jobseq::storage::MemoryBackend;

struct Server {
    gateway: ConfigGateway<MemoryBackend>,
    log: Arc<MemoryAuditLog>,
    backend: MemoryBackend,
}

fn start_server() -> Server {
    let backend = MemoryBackend::new();
    let log = Arc::new(MemoryAuditLog::new());
    let store = SequenceStore::open(backend.clone(), log.clone(), IssuerConfig::default())
        .expect("store should open");
    Server {
        gateway: ConfigGateway::new(Arc::new(store), Arc::new(ManagerList::default())),
        log,
        backend,
    }
}

fn root() -> CallerIdentity {
    CallerIdentity::new("root", "headnode")
}

fn test_user() -> CallerIdentity {
    CallerIdentity::new("pbsuser1", "headnode")
}

// =============================================================================
// Authorization
// =============================================================================

#[test]
fn non_admin_set_is_unauthorized() {
    let server = start_server();
    let err = server
        .gateway
        .set_max_sequence_value(123_456_789i64, &test_user())
        .unwrap_err();

    assert_eq!(err.to_string(), "Unauthorized Request");
    assert_eq!(server.gateway.get_max_sequence_value().unwrap(), 9_999_999);
    assert!(server.log.records().is_empty(), "no log entry for refusals");
}

#[test]
fn non_admin_unset_is_unauthorized() {
    let server = start_server();
    server
        .gateway
        .set_max_sequence_value(123_456_789i64, &root())
        .unwrap();

    let err = server
        .gateway
        .unset_max_sequence_value(&test_user())
        .unwrap_err();
    assert!(matches!(err, ConfigError::Unauthorized));
    assert_eq!(server.gateway.get_max_sequence_value().unwrap(), 123_456_789);
}

#[test]
fn unauthorized_wins_over_invalid_value() {
    let server = start_server();
    for candidate in [
        Candidate::from("ajndd"),
        Candidate::from(23545.45),
        Candidate::from(120_515i64),
    ] {
        let err = server
            .gateway
            .set_max_sequence_value(candidate, &test_user())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Unauthorized));
    }
}

// =============================================================================
// Admin set / unset
// =============================================================================

#[test]
fn admin_set_then_unset_logs_transitions() {
    let server = start_server();
    let start = Utc::now();

    server
        .gateway
        .set_max_sequence_value(123_456_789i64, &root())
        .expect("admin set should succeed");
    assert_eq!(server.gateway.get_max_sequence_value().unwrap(), 123_456_789);
    assert!(server
        .log
        .contains_since("svr_max_job_sequence_id set to val 123456789", start));

    server
        .gateway
        .unset_max_sequence_value(&root())
        .expect("admin unset should succeed");
    assert_eq!(server.gateway.get_max_sequence_value().unwrap(), 9_999_999);
    assert!(server.log.contains_since(
        "svr_max_job_sequence_id reverting back to default val 9999999",
        start
    ));
}

#[test]
fn repeated_unset_is_idempotent() {
    let server = start_server();
    server
        .gateway
        .set_max_sequence_value(999_999_999_999i64, &root())
        .unwrap();
    for _ in 0..3 {
        server.gateway.unset_max_sequence_value(&root()).unwrap();
        assert_eq!(server.gateway.get_max_sequence_value().unwrap(), 9_999_999);
    }
}

// =============================================================================
// Value validation
// =============================================================================

#[test]
fn illegal_values_are_rejected() {
    let server = start_server();
    let invalid = [
        Candidate::from("*456879846"),
        Candidate::from(23545.45),
        Candidate::from("ajndd"),
        Candidate::from("**45"),
        Candidate::from("asgh456"),
    ];
    for candidate in invalid {
        let err = server
            .gateway
            .set_max_sequence_value(candidate.clone(), &root())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Illegal attribute or resource value",
            "candidate {:?}",
            candidate
        );
    }
    assert_eq!(server.gateway.get_max_sequence_value().unwrap(), 9_999_999);
}

#[test]
fn out_of_range_values_are_rejected() {
    let server = start_server();
    for value in [-9_999_999i64, 120_515, 999_999, 1_234_567_891_234, 9_999_999_999_999] {
        let err = server
            .gateway
            .set_max_sequence_value(value, &root())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot set max_job_sequence_id < 9999999, or > 999999999999",
            "value {}",
            value
        );
    }
    assert_eq!(server.gateway.get_max_sequence_value().unwrap(), 9_999_999);
}

#[test]
fn valid_values_are_applied_and_persisted() {
    let server = start_server();
    for value in [9_999_999i64, 123_456_789, 100_000_000_000, 999_999_999_999] {
        server
            .gateway
            .set_max_sequence_value(value, &root())
            .expect("valid value should be accepted");
        assert_eq!(server.gateway.get_max_sequence_value().unwrap(), value as u64);
        assert_eq!(
            server.backend.image().unwrap().max_sequence_value,
            value as u64
        );
    }
}

#[test]
fn failed_persist_reports_storage_error_and_keeps_value() {
    let server = start_server();
    server.backend.fail_next_persists(1);

    let err = server
        .gateway
        .set_max_sequence_value(123_456_789i64, &root())
        .unwrap_err();
    assert!(matches!(err, ConfigError::Storage(_)));
    assert_eq!(server.gateway.get_max_sequence_value().unwrap(), 9_999_999);

    // Serviceable afterwards.
    server
        .gateway
        .set_max_sequence_value(123_456_789i64, &root())
        .unwrap();
}
