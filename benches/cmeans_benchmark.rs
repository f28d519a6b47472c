use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fusioncmeans_rs::{
    CenterFreeEngine, CoordinateEngine, FnDistance, FusionEngine, FuzzyConfig, PredictEngine,
    SeedConfig,
};
use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use std::time::Duration;

fn bench_config(n_clusters: usize) -> FuzzyConfig {
    FuzzyConfig::new(n_clusters)
        .with_max_iters(10)
        .with_error(1e-12)
        .with_seed(42)
}

fn benchmark_coordinate_varying_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinate_samples");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let n_features = 16;
    let n_clusters = 10;
    let sample_sizes = [1_000, 5_000, 10_000];

    for n_samples in sample_sizes.iter() {
        group.throughput(Throughput::Elements(*n_samples as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_samples),
            n_samples,
            |b, &n_samples| {
                let data = Array2::random((n_samples, n_features), Uniform::new(-1.0, 1.0));
                let engine = CoordinateEngine::new(bench_config(n_clusters)).unwrap();

                b.iter(|| engine.fit(black_box(&data.view()), None, None).unwrap());
            },
        );
    }
    group.finish();
}

fn benchmark_coordinate_varying_clusters(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinate_clusters");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let n_samples = 5_000;
    let n_features = 16;
    let cluster_counts = [5, 20, 50];

    for n_clusters in cluster_counts.iter() {
        group.throughput(Throughput::Elements(*n_clusters as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_clusters),
            n_clusters,
            |b, &n_clusters| {
                let data = Array2::random((n_samples, n_features), Uniform::new(-1.0, 1.0));
                let engine = CoordinateEngine::new(bench_config(n_clusters)).unwrap();

                b.iter(|| engine.fit(black_box(&data.view()), None, None).unwrap());
            },
        );
    }
    group.finish();
}

fn benchmark_fusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("fusion");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let n_clusters = 10;
    let sample_sizes = [1_000, 5_000];

    for n_samples in sample_sizes.iter() {
        group.throughput(Throughput::Elements(*n_samples as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_samples),
            n_samples,
            |b, &n_samples| {
                let coordinates = Array2::random((n_samples, 2), Uniform::new(-1.0, 1.0));
                let tags = Array2::random((n_samples, 32), Uniform::new(0.0, 5.0));
                let engine = FusionEngine::new(bench_config(n_clusters)).unwrap();

                b.iter(|| {
                    engine
                        .fit(
                            black_box(&coordinates.view()),
                            black_box(&tags.view()),
                            None,
                            None,
                        )
                        .unwrap()
                });
            },
        );
    }
    group.finish();
}

fn benchmark_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let n_train = 5_000;
    let n_features = 16;
    let n_clusters = 20;
    let predict_sizes = [1_000, 5_000];

    // Pre-train the centers
    let train_data = Array2::random((n_train, n_features), Uniform::new(-1.0, 1.0));
    let trained = CoordinateEngine::new(bench_config(n_clusters))
        .unwrap()
        .fit(&train_data.view(), None, None)
        .unwrap();
    let engine = PredictEngine::new(bench_config(n_clusters)).unwrap();

    for n_predict in predict_sizes.iter() {
        group.throughput(Throughput::Elements(*n_predict as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_predict),
            n_predict,
            |b, &n_predict| {
                let test_data = Array2::random((n_predict, n_features), Uniform::new(-1.0, 1.0));

                b.iter(|| {
                    engine
                        .predict(&trained.centers.view(), black_box(&test_data.view()), None)
                        .unwrap()
                });
            },
        );
    }
    group.finish();
}

fn benchmark_center_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("center_free");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    let n_samples = 2_000;
    let positions: Array1<f64> = Array1::random(n_samples, Uniform::new(0.0, 1.0));
    let metric = FnDistance::new(n_samples, |i, j| (positions[i] - positions[j]).abs());

    group.bench_function("2k_sequences_8_clusters", |b| {
        let engine = CenterFreeEngine::new(
            FuzzyConfig::center_free(8).with_seed(42),
            SeedConfig::new(30).with_distance_threshold(0.1),
        )
        .unwrap();

        b.iter(|| engine.fit(black_box(&metric), None, None).unwrap());
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_coordinate_varying_samples,
    benchmark_coordinate_varying_clusters,
    benchmark_fusion,
    benchmark_predict,
    benchmark_center_free,
);

criterion_main!(benches);
