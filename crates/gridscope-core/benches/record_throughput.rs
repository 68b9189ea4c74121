//! Trace capture overhead benchmarks
//!
//! Measures the per-operation cost of the recorder paths an interpreted
//! instance hits most: bounds-checked loads and the sampling filter.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridscope_core::{AddressBatch, DType, GridDim, GridIdx, TensorDesc, TraceSession};

fn session_with_registry(tensors: usize) -> TraceSession {
    let mut session = TraceSession::new();
    session.begin_launch(GridDim::linear(1)).unwrap();
    for i in 0..tensors {
        let base = 0x1000 + (i as u64) * 0x10000;
        session
            .register_tensor(TensorDesc::new(base, DType::F32, vec![1024], vec![1]).unwrap())
            .unwrap();
    }
    session.finalize_tensors().unwrap();
    session.set_active_cell(GridIdx::origin()).unwrap();
    session
}

fn benchmark_masked_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("masked_load");

    for lanes in [16, 128, 1024] {
        group.bench_with_input(BenchmarkId::new("in_bounds", lanes), &lanes, |b, &n| {
            let ptrs = AddressBatch::linear((0..n as u64).map(|i| 0x1000 + i * 4).collect());
            let predicate = vec![true; n];

            // Capture a bounded launch per iteration so the record list
            // does not grow across the measurement.
            b.iter(|| {
                let mut session = session_with_registry(8);
                for _ in 0..16 {
                    session.on_masked_load(black_box(&ptrs), &predicate).unwrap();
                }
                black_box(session.launches()[0].records().len());
            });
        });
    }

    group.finish();
}

fn benchmark_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_tensor");

    for tensors in [4, 64, 512] {
        group.bench_with_input(BenchmarkId::new("floor_lookup", tensors), &tensors, |b, &n| {
            let session = session_with_registry(n);
            let addr = 0x1000 + (n as u64 / 2) * 0x10000 + 128;

            b.iter(|| {
                black_box(session.resolve_tensor(black_box(addr)).unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_sampled_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling_filter");

    group.bench_function("record_dropped", |b| {
        let mut session = TraceSession::new();
        session.set_sampling_idx(&[63]).unwrap();
        session.begin_launch(GridDim::linear(64)).unwrap();
        session
            .register_tensor(TensorDesc::new(0x1000, DType::F32, vec![1024], vec![1]).unwrap())
            .unwrap();
        session.finalize_tensors().unwrap();
        session.set_active_cell(GridIdx::origin()).unwrap();
        let ptrs = AddressBatch::linear((0..64u64).map(|i| 0x1000 + i * 4).collect());
        let predicate = vec![true; 64];

        b.iter(|| {
            session.on_masked_load(black_box(&ptrs), &predicate).unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_masked_load,
    benchmark_resolution,
    benchmark_sampled_out
);
criterion_main!(benches);
