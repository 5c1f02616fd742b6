//! Collection write benchmarks.
//!
//! Every write rewrites the whole data file, so cost grows with the number
//! of records already stored.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use moonlight_core::{LogLevel, Store, StoreConfig};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Generate a random record with a string payload of `size` characters.
fn random_record(size: usize) -> Value {
    let mut rng = rand::thread_rng();
    let payload: String = (0..size).map(|_| rng.sample(Alphanumeric) as char).collect();
    json!({ "score": rng.gen_range(0..100), "payload": payload })
}

/// Open a quiet collection holding `count` records.
fn seeded_store(count: usize) -> (TempDir, Store) {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::new(temp.path()).log_levels(Vec::<LogLevel>::new());
    let store = Store::open("bench", &config).unwrap();
    for _ in 0..count {
        store.push(random_record(64)).unwrap();
    }
    (temp, store)
}

/// Benchmark a push into collections of increasing size.
fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("push");
    group.sample_size(20);

    for existing in [0, 100, 1000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(existing),
            existing,
            |b, &existing| {
                let (_temp, store) = seeded_store(existing);
                let record = random_record(64);

                b.iter(|| {
                    store.push(black_box(record.clone())).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark payload size for a push into an empty collection.
fn bench_push_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_payload");
    group.sample_size(20);

    for size in [64, 1024, 16384].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let record = random_record(size);
            b.iter_batched(
                || seeded_store(0),
                |(_temp, store)| {
                    store.push(black_box(record.clone())).unwrap();
                },
                criterion::BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

/// Benchmark an update by id.
fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    group.sample_size(20);

    for existing in [100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(existing),
            existing,
            |b, &existing| {
                let (_temp, store) = seeded_store(existing);
                let id = store.push(random_record(64)).unwrap();
                let mut n = 0u64;

                b.iter(|| {
                    n += 1;
                    store.update(black_box(json!({ "id": id, "score": n }))).unwrap();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_push, bench_push_payload, bench_update);
criterion_main!(benches);
