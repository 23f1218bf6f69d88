use criterion::measurement::Measurement;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion};
use lle::dimred::lle::{compute_embedding, compute_weights, LLEBuilder};
use lle::neighbors::find_neighbors;
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

#[derive(Clone)]
pub struct LleBenchConfig {
    seed: u64,
    point_counts: Vec<usize>,
    dimensions: usize,
    n_neighbors: usize,
    n_components: usize,
    measurement_time: u64,
    sample_size: usize,
}

impl Default for LleBenchConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            point_counts: vec![100, 250, 500],
            dimensions: 10,
            n_neighbors: 12,
            n_components: 2,
            measurement_time: 10,
            sample_size: 10,
        }
    }
}

/// Noisy samples from a swiss roll embedded in `dims` dimensions.
fn create_swiss_roll(n_points: usize, dims: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Array2::zeros((n_points, dims.max(3)));
    for i in 0..n_points {
        let t = 1.5 * std::f64::consts::PI * (1.0 + 2.0 * rng.random::<f64>());
        let height = 20.0 * rng.random::<f64>();
        points[[i, 0]] = t * t.cos();
        points[[i, 1]] = height;
        points[[i, 2]] = t * t.sin();
        for d in 3..dims {
            points[[i, d]] = 0.01 * rng.random::<f64>();
        }
    }
    points
}

fn configure_group<'a, M: Measurement>(
    c: &'a mut Criterion<M>,
    name: &str,
    config: &LleBenchConfig,
) -> BenchmarkGroup<'a, M> {
    let mut group = c.benchmark_group(name);
    group.measurement_time(Duration::from_secs(config.measurement_time));
    group.sample_size(config.sample_size);
    group
}

pub fn bench_lle_stages(c: &mut Criterion) {
    let config = LleBenchConfig::default();
    let mut group = configure_group(c, "LLE_Stages", &config);

    for &n_points in config.point_counts.iter() {
        let seed = config.seed + n_points as u64;
        let points = create_swiss_roll(n_points, config.dimensions, seed);
        let neighbors = find_neighbors(config.n_neighbors, points.view()).unwrap();
        let weights = compute_weights(points.view(), &neighbors).unwrap();

        group.bench_with_input(
            BenchmarkId::new("neighbors", n_points),
            &n_points,
            |b, _| {
                b.iter(|| find_neighbors(config.n_neighbors, points.view()).unwrap());
            },
        );

        group.bench_with_input(BenchmarkId::new("weights", n_points), &n_points, |b, _| {
            b.iter(|| compute_weights(points.view(), &neighbors).unwrap());
        });

        group.bench_with_input(
            BenchmarkId::new("embedding", n_points),
            &n_points,
            |b, _| {
                b.iter(|| compute_embedding(config.n_components, weights.view()).unwrap());
            },
        );
    }
    group.finish();
}

pub fn bench_lle_pipeline(c: &mut Criterion) {
    let config = LleBenchConfig::default();
    let mut group = configure_group(c, "LLE_Pipeline", &config);

    let lle = LLEBuilder::new()
        .n_neighbors(config.n_neighbors)
        .n_components(config.n_components)
        .build();

    for &n_points in config.point_counts.iter() {
        let seed = config.seed + n_points as u64;
        let points = create_swiss_roll(n_points, config.dimensions, seed);

        group.bench_with_input(
            BenchmarkId::new("fit_transform", n_points),
            &n_points,
            |b, _| {
                b.iter(|| lle.fit_transform(points.view()).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(lle_benches, bench_lle_stages, bench_lle_pipeline);
criterion_main!(lle_benches);
