//! Collection read benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use moonlight_core::{LogLevel, RecordId, Store, StoreConfig};
use rand::Rng;
use serde_json::json;
use tempfile::TempDir;

/// Open a quiet collection holding `count` records and return their ids.
fn seeded_store(count: usize) -> (TempDir, Store, Vec<RecordId>) {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig::new(temp.path()).log_levels(Vec::<LogLevel>::new());
    let store = Store::open("bench", &config).unwrap();
    let mut rng = rand::thread_rng();
    let ids = (0..count)
        .map(|i| {
            store
                .push(json!({ "index": i, "bucket": rng.gen_range(0..10) }))
                .unwrap()
        })
        .collect();
    (temp, store, ids)
}

/// Benchmark reading every record.
fn bench_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("all");

    for count in [100, 500, 2000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (_temp, store, _ids) = seeded_store(count);
            b.iter(|| black_box(store.all().unwrap()));
        });
    }
    group.finish();
}

/// Benchmark a lookup by id.
fn bench_get_by_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_by_id");

    for count in [100, 500, 2000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (_temp, store, ids) = seeded_store(count);
            let mut rng = rand::thread_rng();

            b.iter(|| {
                let id = ids[rng.gen_range(0..ids.len())];
                black_box(store.get(&json!({ "id": id })).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark field counting.
fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("count");

    for count in [100, 500, 2000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (_temp, store, _ids) = seeded_store(count);
            b.iter(|| black_box(store.count("bucket", json!(3)).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_all, bench_get_by_id, bench_count);
criterion_main!(benches);
