//! Concurrency tests for job sequence issuance.
//!
//! These tests verify uniqueness and bounds under concurrent allocation and
//! reconfiguration.
//! Run with: cargo test --test concurrency_tests

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use jobseq::audit::MemoryAuditLog;
use jobseq::contracts::{PersistedSequence, SequenceIssuer};
use jobseq::sequence::{IssuerConfig, MaxSequenceValue, SequenceStore};
use jobseq::storage::{MemoryBackend, RocksDbBackend};
use tempfile::TempDir;

fn memory_store(
    image: Option<PersistedSequence>,
    config: IssuerConfig,
) -> Arc<SequenceStore<MemoryBackend>> {
    let backend = image.map(MemoryBackend::with_image).unwrap_or_default();
    Arc::new(
        SequenceStore::open(backend, Arc::new(MemoryAuditLog::new()), config)
            .expect("store should open"),
    )
}

fn allocate_in_parallel<S: SequenceIssuer + 'static>(
    store: Arc<S>,
    threads: usize,
    per_thread: usize,
) -> Vec<u64> {
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let s = Arc::clone(&store);
            thread::spawn(move || {
                (0..per_thread)
                    .map(|_| s.allocate_next().expect("allocation should succeed").id)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

// =============================================================================
// Parallel Allocation Tests
// =============================================================================

/// Parallel allocations produce distinct ids within bounds.
#[test]
fn parallel_allocations_no_duplicates() {
    let store = memory_store(None, IssuerConfig::default());
    let ids = allocate_in_parallel(Arc::clone(&store), 10, 200);

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len(), "Found duplicate ids");
    assert_eq!(ids.len(), 2000);

    let max = store.current_max().unwrap().get();
    assert!(ids.iter().all(|&id| (1..=max).contains(&id)));
    assert_eq!(store.current_value().unwrap(), 2000);
}

/// Batched reservations do not weaken uniqueness.
#[test]
fn parallel_allocations_with_reservation_batches() {
    let config = IssuerConfig {
        reserve_batch: 32,
        ..IssuerConfig::default()
    };
    let store = memory_store(None, config);
    let ids = allocate_in_parallel(Arc::clone(&store), 8, 250);

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 2000);
    assert_eq!(*unique.iter().max().unwrap(), 2000);
}

/// Durable backend under contention.
#[test]
fn parallel_allocations_rocksdb() {
    let dir = TempDir::new().unwrap();
    let backend = RocksDbBackend::open(dir.path()).unwrap();
    let store = Arc::new(
        SequenceStore::open(
            backend,
            Arc::new(MemoryAuditLog::new()),
            IssuerConfig::default(),
        )
        .unwrap(),
    );

    let ids = allocate_in_parallel(store, 4, 50);
    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 200);
}

// =============================================================================
// Wraparound Under Contention
// =============================================================================

/// Threads racing across the wrap point see exactly one wrap and no
/// duplicates.
#[test]
fn parallel_allocations_across_wrap() {
    let max = 9_999_999;
    let store = memory_store(
        Some(PersistedSequence {
            max_sequence_value: max,
            current_value: max - 100,
        }),
        IssuerConfig::default(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let s = Arc::clone(&store);
            thread::spawn(move || {
                (0..50)
                    .map(|_| s.allocate_next().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let allocations: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(allocations.iter().filter(|a| a.wrapped).count(), 1);
    let unique: HashSet<u64> = allocations.iter().map(|a| a.id).collect();
    assert_eq!(unique.len(), 200);
    assert!(allocations.iter().all(|a| a.id >= 1 && a.id <= max));
    // 100 ids before the wrap, 100 after it.
    assert_eq!(allocations.iter().filter(|a| a.id <= 100).count(), 100);
}

// =============================================================================
// Reconfiguration Under Load
// =============================================================================

/// Allocations racing with set/unset never exceed the maximum in force.
#[test]
fn reconfiguration_under_load_respects_bounds() {
    let store = memory_store(
        Some(PersistedSequence {
            max_sequence_value: 123_456_789,
            current_value: 9_999_900,
        }),
        IssuerConfig::default(),
    );
    let high = MaxSequenceValue::try_from(123_456_789).unwrap();

    let admin = {
        let s = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..50 {
                if i % 2 == 0 {
                    s.revert_to_default().unwrap();
                } else {
                    s.apply_max(high).unwrap();
                }
            }
            s.revert_to_default().unwrap();
        })
    };

    let ids = allocate_in_parallel(Arc::clone(&store), 4, 100);
    admin.join().unwrap();

    assert!(ids.iter().all(|&id| id >= 1 && id <= high.get()));

    // After the final revert, the next id fits the default bound.
    let next = store.allocate_next().unwrap();
    assert!(next.id <= MaxSequenceValue::DEFAULT.get());
}
