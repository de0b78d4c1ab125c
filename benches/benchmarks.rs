//! Benchmarks for the hot per-step operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use inflow::{RollingAccuracy, SparsePattern, Trace, TraceStep};

fn step(record_number: u64) -> TraceStep {
    let pattern = SparsePattern::from_indices((0..40).map(|i| i * 16).collect(), 2048).unwrap();
    TraceStep {
        record_number,
        sensor_value: 0.5,
        actual_category: 1,
        active_cells: Some(pattern.clone()),
        predicted_active_cells: Some(pattern),
        anomaly_score: Some(0.2),
        pooled_active_cells: None,
        classification_inference: 1,
        classification_accuracy: 0.5,
        clustering_inference: Some(1),
        predicted_cluster_id: Some(0),
        clustering_accuracy: 0.5,
        cluster_homogeneity: 80.0,
        clustering_confidence: Some(0.9),
    }
}

fn bench_trace_append(c: &mut Criterion) {
    c.bench_function("trace_append_1000", |b| {
        b.iter(|| {
            let mut trace = Trace::new();
            for i in 0..1000 {
                trace.append(black_box(step(i))).unwrap();
            }
            trace
        })
    });
}

fn bench_rolling_accuracy(c: &mut Criterion) {
    c.bench_function("rolling_accuracy_update", |b| {
        let mut acc = RollingAccuracy::new(10).unwrap();
        acc.update(Some(1), 1, true);
        b.iter(|| acc.update(black_box(Some(1)), black_box(1), true))
    });
}

fn bench_pattern_overlap(c: &mut Criterion) {
    let a = SparsePattern::from_indices((0..40).map(|i| i * 16).collect(), 2048).unwrap();
    let b_pat = SparsePattern::from_indices((0..40).map(|i| i * 16 + 8).collect(), 2048).unwrap();
    c.bench_function("pattern_overlap_40_active", |b| {
        b.iter(|| black_box(&a).overlap(black_box(&b_pat)))
    });
}

criterion_group!(
    benches,
    bench_trace_append,
    bench_rolling_accuracy,
    bench_pattern_overlap
);
criterion_main!(benches);
