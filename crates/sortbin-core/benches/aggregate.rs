//! Benchmarks for score aggregation and the CLIP probability head.
//!
//! Run with: cargo bench -p sortbin-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sortbin_core::classifier::probabilities;
use sortbin_core::{aggregate, LabelIndex, TaxonomyTable};

fn uniform_distribution(n: usize) -> Vec<f32> {
    vec![1.0 / n as f32; n]
}

fn benchmark_aggregate_builtin(c: &mut Criterion) {
    let index = LabelIndex::build(&TaxonomyTable::builtin()).unwrap();
    let dist = uniform_distribution(index.len());

    c.bench_function("aggregate_builtin_taxonomy", |b| {
        b.iter(|| aggregate(black_box(&index), black_box(&dist)).unwrap())
    });
}

fn benchmark_aggregate_large(c: &mut Criterion) {
    let table = TaxonomyTable::new((0..200).map(|cat| {
        (
            format!("category-{cat}"),
            (0..25)
                .map(|d| format!("descriptor-{cat}-{d}"))
                .collect::<Vec<_>>(),
        )
    }));
    let index = LabelIndex::build(&table).unwrap();
    let dist = uniform_distribution(index.len());

    c.bench_function("aggregate_5000_descriptors", |b| {
        b.iter(|| aggregate(black_box(&index), black_box(&dist)).unwrap())
    });
}

fn benchmark_probabilities(c: &mut Criterion) {
    let cosines: Vec<f32> = (0..51).map(|i| 0.15 + i as f32 * 0.001).collect();

    c.bench_function("clip_probabilities_51", |b| {
        b.iter(|| probabilities(black_box(&cosines), black_box(100.0)))
    });
}

criterion_group!(
    benches,
    benchmark_aggregate_builtin,
    benchmark_aggregate_large,
    benchmark_probabilities
);
criterion_main!(benches);
