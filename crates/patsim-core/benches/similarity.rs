//! Benchmarks for set-similarity scoring and query expansion.
//!
//! Run with: `cargo bench -p patsim-core --bench similarity`
//!
//! Result sets are small in production (`DEFAULT_TOP_N` identifiers), so
//! these mostly guard against accidental quadratic behavior when larger
//! caps are configured.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use patsim_core::config::DEFAULT_TOP_N;
use patsim_core::expansion::expand;
use patsim_core::similarity::{compute_distances, dice_distance, jaccard_distance, SetLabel};
use std::collections::HashSet;

// =============================================================================
// Test Data Generation
// =============================================================================

/// Publication-number-like identifiers `US{offset}..US{offset + size}`.
fn identifiers(offset: usize, size: usize) -> HashSet<String> {
    (offset..offset + size).map(|i| format!("US{}B2", i)).collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_pairwise_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity/pairwise");

    for size in [DEFAULT_TOP_N, 30, 100, 1000] {
        // Half overlap
        let a = identifiers(0, size);
        let b = identifiers(size / 2, size);

        group.bench_with_input(BenchmarkId::new("jaccard", size), &size, |bench, _| {
            bench.iter(|| jaccard_distance(black_box(&a), black_box(&b)));
        });
        group.bench_with_input(BenchmarkId::new("dice", size), &size, |bench, _| {
            bench.iter(|| dice_distance(black_box(&a), black_box(&b)));
        });
    }
    group.finish();
}

fn bench_distance_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity/vector");

    for size in [DEFAULT_TOP_N, 30] {
        let t1 = identifiers(0, size);
        let t2 = identifiers(size / 3, size);
        let or = identifiers(0, size + size / 3);
        let and = identifiers(size / 3, size / 2);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| {
                compute_distances(
                    black_box(&t1),
                    black_box(&t2),
                    &[(SetLabel::Or, Some(&or)), (SetLabel::And, Some(&and))],
                )
            });
        });
    }
    group.finish();
}

fn bench_expand(c: &mut Criterion) {
    c.bench_function("expansion/acronym", |b| {
        b.iter(|| {
            expand(
                black_box("dslr camera"),
                black_box("digital single lens reflex camera"),
                black_box(Some("dslr")),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_pairwise_distance,
    bench_distance_vector,
    bench_expand,
);

criterion_main!(benches);
