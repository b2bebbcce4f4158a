/*
 * Boid Simulation Benchmark
 *
 * Measures the pieces that dominate a tick: filling each spatial index,
 * answering neighbor queries from it, and a full simulation step with both
 * structures, sequential and parallel.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use shoal::{IndexKind, NeighborIndex, Simulation, SimulationParams, SpatialIndex};

fn random_points(n: usize, extent: f32) -> Vec<Vec3> {
    let mut rng = SmallRng::seed_from_u64(11);
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            )
        })
        .collect()
}

fn fill(index: &mut SpatialIndex, points: &[Vec3]) {
    index.clear();
    for (i, p) in points.iter().enumerate() {
        index.insert(*p, i);
    }
}

// Clearing and refilling each structure, which the octree does every tick
fn bench_index_rebuild(c: &mut Criterion) {
    let params = SimulationParams::default();
    let mut group = c.benchmark_group("index_rebuild");

    for n in [500, 1000, 4000] {
        let points = random_points(n, 60.0);
        for kind in [IndexKind::Grid, IndexKind::Octree] {
            let mut index = SpatialIndex::new(kind, &params);
            group.bench_with_input(BenchmarkId::new(format!("{kind:?}"), n), &points, |b, points| {
                b.iter(|| fill(&mut index, black_box(points)));
            });
        }
    }

    group.finish();
}

// One neighbor query per point against a filled structure
fn bench_index_queries(c: &mut Criterion) {
    let params = SimulationParams::default();
    let mut group = c.benchmark_group("index_queries");

    for n in [1000, 4000] {
        let points = random_points(n, 60.0);
        for kind in [IndexKind::Grid, IndexKind::Octree] {
            let mut index = SpatialIndex::new(kind, &params);
            fill(&mut index, &points);
            let mut out = Vec::new();

            group.bench_with_input(BenchmarkId::new(format!("{kind:?}"), n), &points, |b, points| {
                b.iter(|| {
                    let mut total = 0;
                    for p in points {
                        out.clear();
                        index.find_near(*p, &mut out);
                        total += out.len();
                    }
                    black_box(total)
                });
            });
        }
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_step");
    group.sample_size(30);

    for kind in [IndexKind::Grid, IndexKind::Octree] {
        for parallel in [false, true] {
            let params = SimulationParams {
                num_boids: 1000,
                index_kind: kind,
                enable_parallel: parallel,
                seed: Some(3),
                ..Default::default()
            };
            let Ok(mut sim) = Simulation::new(params) else {
                continue;
            };
            let label = if parallel { "parallel" } else { "sequential" };

            group.bench_function(BenchmarkId::new(format!("{kind:?}"), label), |b| {
                b.iter(|| black_box(sim.step(1.0 / 60.0)));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_index_rebuild, bench_index_queries, bench_step);
criterion_main!(benches);
