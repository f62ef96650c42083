//! Criterion benchmarks for grove-tree: forest training and ensemble evaluation.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use grove_tree::{
    DataSet, EnsembleProcessor, ForestConfig, ParallelProcessor, Scheduler, SequentialProcessor,
    TreeConfig,
};

fn make_classification(
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    seed: u64,
) -> DataSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rows = (0..n_samples)
        .map(|i| {
            let class = i % n_classes;
            let mut row: Vec<f64> = (0..n_features)
                .map(|f| {
                    let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                    base + rng.r#gen::<f64>() * 0.5
                })
                .collect();
            row.push(class as f64);
            row
        })
        .collect();
    DataSet::new(rows).unwrap()
}

fn bench_forest_train(c: &mut Criterion) {
    let data = make_classification(500, 20, 5, 42);
    let scheduler = Scheduler::new(0).unwrap();
    let cfg = ForestConfig::random_forest(50, 5).unwrap().with_seed(42);

    c.bench_function("forest_train_500x20_5class_50trees", |b| {
        b.iter(|| cfg.fit(&data, &scheduler).unwrap());
    });
}

fn bench_single_tree(c: &mut Criterion) {
    let data = make_classification(500, 20, 5, 42);
    let cfg = TreeConfig::new();

    c.bench_function("tree_full_scan_500x20_5class", |b| {
        b.iter(|| cfg.fit(&data).unwrap());
    });
}

fn bench_ensemble_processors(c: &mut Criterion) {
    let data = make_classification(500, 20, 5, 42);
    let scheduler = Scheduler::new(0).unwrap();
    let forest = ForestConfig::random_forest(400, 5)
        .unwrap()
        .with_resample_ratio(0.5)
        .fit(&data, &scheduler)
        .unwrap();
    let query = data.row(0).to_vec();
    let parallel = ParallelProcessor::new(scheduler);

    c.bench_function("ensemble_sequential_400trees", |b| {
        b.iter(|| {
            SequentialProcessor
                .predictions(forest.trees(), &query)
                .unwrap()
        });
    });
    c.bench_function("ensemble_parallel_400trees", |b| {
        b.iter(|| parallel.predictions(forest.trees(), &query).unwrap());
    });
}

criterion_group!(
    benches,
    bench_forest_train,
    bench_single_tree,
    bench_ensemble_processors
);
criterion_main!(benches);
