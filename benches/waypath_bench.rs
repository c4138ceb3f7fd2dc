//! Criterion benchmarks for u-waypath solvers.
//!
//! Uses uniformly scattered waypoints in a 100-unit cube to measure solver
//! overhead at a few problem sizes.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_waypath::distance::{compute_cost_matrix, CostMatrix};
use u_waypath::engine::BranchAndBoundEngine;
use u_waypath::exact::ExactSolver;
use u_waypath::sa::{AnnealingConfig, AnnealingSolver};
use u_waypath::{NearestNeighbor, RouteKind, Waypoint};

fn scattered(n: usize, seed: u64) -> Vec<Waypoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|id| {
            Waypoint::new(
                id,
                rng.random_range(0.0..100.0),
                rng.random_range(0.0..100.0),
                rng.random_range(0.0..100.0),
            )
        })
        .collect()
}

fn matrix(n: usize) -> CostMatrix {
    compute_cost_matrix(&scattered(n, 42), None).expect("scattered waypoints are distinct")
}

// ===========================================================================
// Distance model
// ===========================================================================

fn bench_cost_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("cost_matrix");

    for &n in &[50, 200, 500] {
        let wps = scattered(n, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n), &wps, |b, wps| {
            b.iter(|| black_box(compute_cost_matrix(black_box(wps), None)))
        });
    }
    group.finish();
}

// ===========================================================================
// Solvers
// ===========================================================================

fn bench_nearest_neighbor(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_neighbor");

    for &n in &[50, 200, 500] {
        let m = matrix(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &m, |b, m| {
            b.iter(|| black_box(NearestNeighbor::solve(black_box(m), 0, RouteKind::Closed)))
        });
    }
    group.finish();
}

fn bench_annealing(c: &mut Criterion) {
    let mut group = c.benchmark_group("annealing");
    group.sample_size(10);

    for &n in &[20, 50, 100] {
        let m = matrix(n);
        let config = AnnealingConfig::default()
            .with_max_iterations(20_000)
            .with_seed(42);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(m, config), |b, (m, c)| {
            b.iter(|| black_box(AnnealingSolver::solve(black_box(m), black_box(c), None)))
        });
    }
    group.finish();
}

fn bench_exact(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact");
    group.sample_size(10);

    let engine = BranchAndBoundEngine::default();
    for &n in &[8, 11, 13] {
        let m = matrix(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &m, |b, m| {
            b.iter(|| {
                black_box(ExactSolver::new(&engine).solve(black_box(m), Duration::from_secs(30)))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_cost_matrix,
    bench_nearest_neighbor,
    bench_annealing,
    bench_exact
);
criterion_main!(benches);
