//! Simulation benchmarks for hearth_core.
//!
//! Run with: `cargo bench -p hearth_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hearth_core::jobs::TrainingOrder;
use hearth_core::persistence;
use hearth_test_utils::fixtures::{sprawl, DAY_MS, EPOCH};

/// One tick over settlements of increasing size.
pub fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for count in [10usize, 100, 1_000, 10_000] {
        let mut state = sprawl(count, 5);
        state
            .training
            .start(TrainingOrder {}, 1_000, EPOCH)
            .expect("idle slot");
        group.bench_with_input(BenchmarkId::from_parameter(count), &state, |b, state| {
            b.iter(|| {
                let mut state = state.clone();
                black_box(state.tick(black_box(EPOCH + DAY_MS)))
            });
        });
    }
    group.finish();
}

/// Save and load a large settlement.
pub fn persistence_benchmark(c: &mut Criterion) {
    let state = sprawl(1_000, 3);
    let bytes = persistence::encode(&state).expect("encodes");
    c.bench_function("encode_1000", |b| {
        b.iter(|| persistence::encode(black_box(&state)));
    });
    c.bench_function("decode_1000", |b| {
        b.iter(|| persistence::decode(black_box(&bytes), EPOCH));
    });
}

criterion_group!(benches, tick_benchmark, persistence_benchmark);
criterion_main!(benches);
