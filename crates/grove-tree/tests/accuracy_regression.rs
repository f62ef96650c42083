//! Accuracy regression tests for grove-tree.
//!
//! These tests verify that algorithmic changes do not degrade forest
//! classification accuracy on a deterministic synthetic dataset.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use grove_tree::{CrossValidation, DataSet, ForestConfig, Scheduler, TreeConfig, accuracy};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic classification dataset
// ---------------------------------------------------------------------------

/// Generate a 300-sample, 10-feature, 3-class classification dataset.
///
/// Features 0-2 are informative (class * 3.0 + noise in [0, 0.5]).
/// Features 3-9 are pure noise in [0, 0.5].
/// Samples are assigned round-robin across classes; the label is the last column.
fn make_classification() -> DataSet {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let n_samples = 300;
    let n_features = 10;
    let n_classes = 3;

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

fn scheduler() -> Scheduler {
    Scheduler::new(4).unwrap()
}

// ---------------------------------------------------------------------------
// a) cv_accuracy_above_threshold
// ---------------------------------------------------------------------------

/// 5-fold cross-validation mean accuracy must exceed 0.85 on the synthetic dataset.
#[test]
fn cv_accuracy_above_threshold() {
    let data = make_classification();
    let config = ForestConfig::random_forest(50, 3).unwrap().with_seed(42);
    let cv = CrossValidation::new(5).unwrap().with_seed(42);
    let result = cv.evaluate(&config, &data, &scheduler()).unwrap();

    assert!(
        result.mean_accuracy > 0.85,
        "cv mean_accuracy {} <= 0.85",
        result.mean_accuracy
    );
}

// ---------------------------------------------------------------------------
// b) bagging_accuracy_on_training_data
// ---------------------------------------------------------------------------

/// Training accuracy of a bagged ensemble must exceed 0.95.
#[test]
fn bagging_accuracy_on_training_data() {
    let data = make_classification();
    let scheduler = scheduler();
    let forest = ForestConfig::bagging(25)
        .unwrap()
        .with_seed(42)
        .fit(&data, &scheduler)
        .unwrap();

    let predictions = forest.predict_batch(data.rows(), &scheduler).unwrap();
    let acc = accuracy(&predictions, &data.labels()).unwrap();
    assert!(acc > 0.95, "training accuracy {acc} <= 0.95");
}

// ---------------------------------------------------------------------------
// c) single_tree_accuracy_on_training_data
// ---------------------------------------------------------------------------

/// A single full-scan tree separates the informative features on its own.
#[test]
fn single_tree_accuracy_on_training_data() {
    let data = make_classification();
    let tree = TreeConfig::new().with_max_depth(6).fit(&data).unwrap();

    let predictions: Vec<f64> = data
        .rows()
        .iter()
        .map(|row| tree.predict(row).unwrap())
        .collect();
    let acc = accuracy(&predictions, &data.labels()).unwrap();
    assert!(acc > 0.95, "single tree accuracy {acc} <= 0.95");
}

// ---------------------------------------------------------------------------
// d) deterministic_predictions
// ---------------------------------------------------------------------------

/// Same config and seed must produce identical predictions across two
/// independent runs, even on pools of different sizes.
#[test]
fn deterministic_predictions() {
    let data = make_classification();
    let config = ForestConfig::random_forest(40, 3)
        .unwrap()
        .with_resample_ratio(0.8)
        .with_seed(42);

    let narrow = Scheduler::new(1).unwrap();
    let wide = scheduler();
    let forest1 = config.fit(&data, &narrow).unwrap();
    let forest2 = config.fit(&data, &wide).unwrap();

    let preds1 = forest1.predict_batch(data.rows(), &narrow).unwrap();
    let preds2 = forest2.predict_batch(data.rows(), &wide).unwrap();

    assert_eq!(
        preds1, preds2,
        "predictions differ across runs with the same seed"
    );
}
