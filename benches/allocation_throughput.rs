//! Benchmarks for job sequence issuance.
//!
//! Run with: cargo bench
//! View results in: target/criterion/report/index.html

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jobseq::audit::MemoryAuditLog;
use jobseq::contracts::SequenceIssuer;
use jobseq::sequence::{validate_max_sequence, Candidate, IssuerConfig, SequenceStore};
use jobseq::storage::{MemoryBackend, RocksDbBackend};
use tempfile::TempDir;

fn rocksdb_store(reserve_batch: u64) -> (SequenceStore<RocksDbBackend>, TempDir) {
    let dir = TempDir::new().unwrap();
    let backend = RocksDbBackend::open(dir.path()).unwrap();
    let config = IssuerConfig {
        reserve_batch,
        ..IssuerConfig::default()
    };
    let store = SequenceStore::open(backend, Arc::new(MemoryAuditLog::new()), config).unwrap();
    (store, dir)
}

// =============================================================================
// Allocation Benchmarks
// =============================================================================

fn bench_allocate_rocksdb(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_rocksdb");
    group.throughput(Throughput::Elements(1));

    // Every id synced vs. one sync per reserved window
    for batch in [1u64, 64].iter() {
        let (store, _dir) = rocksdb_store(*batch);
        group.bench_with_input(BenchmarkId::from_parameter(batch), batch, |b, _| {
            b.iter(|| black_box(store.allocate_next().unwrap()));
        });
    }

    group.finish();
}

fn bench_allocate_memory(c: &mut Criterion) {
    let store = SequenceStore::open(
        MemoryBackend::new(),
        Arc::new(MemoryAuditLog::new()),
        IssuerConfig::default(),
    )
    .unwrap();

    c.bench_function("allocate_memory", |b| {
        b.iter(|| black_box(store.allocate_next().unwrap()));
    });
}

// =============================================================================
// Validation Benchmarks
// =============================================================================

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_max_sequence");

    let inputs = [
        ("integer", Candidate::from(123_456_789i64)),
        ("text", Candidate::from("  999999999999 ")),
        ("malformed", Candidate::from("asgh456")),
    ];
    for (name, candidate) in inputs.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), candidate, |b, candidate| {
            b.iter(|| validate_max_sequence(black_box(candidate)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_allocate_rocksdb,
    bench_allocate_memory,
    bench_validate
);
criterion_main!(benches);
