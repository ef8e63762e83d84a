use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lifeboat::training::{
    Estimator, GradientBoostingConfig, GradientBoostingRegressor, RandomForestClassifier,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn synthetic_classification(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut rows = Vec::with_capacity(n_rows * n_features);
    let mut labels = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let mut sum = 0.0;
        for _ in 0..n_features {
            let v: f64 = rng.gen::<f64>() * 10.0;
            sum += v;
            rows.push(v);
        }
        labels.push(if sum > 5.0 * n_features as f64 { 1.0 } else { 0.0 });
    }
    (
        Array2::from_shape_vec((n_rows, n_features), rows).unwrap(),
        Array1::from_vec(labels),
    )
}

fn bench_forest_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest_fit");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let (x, y) = synthetic_classification(*n_rows, 10);
        group.bench_with_input(BenchmarkId::new("fit", n_rows), n_rows, |b, _| {
            b.iter(|| {
                let mut forest = RandomForestClassifier::new(10).with_seed(42);
                forest.fit(black_box(&x), black_box(&y)).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_boosting_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("boosting_fit");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let (x, y) = synthetic_classification(*n_rows, 10);
        group.bench_with_input(BenchmarkId::new("fit", n_rows), n_rows, |b, _| {
            b.iter(|| {
                let config = GradientBoostingConfig::default().with_n_estimators(50);
                let mut model = GradientBoostingRegressor::new(config);
                model.fit(black_box(&x), black_box(&y)).unwrap();
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_forest_fit, bench_boosting_fit);
criterion_main!(benches);
