//! JSON result writer for evaluation and classification outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes evaluation and classification results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_evaluate.json` and
/// `{experiment}_classify.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write cross-validation results to `{experiment}_evaluate.json`.
    ///
    /// Takes primitives so the writer has no dependency on `grove-tree`.
    /// `class_labels[i]` names row and column `i` of `confusion_matrix` and
    /// entry `i` of `class_metrics` (precision, recall, f1, support).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        n_trees: usize,
        cv_accuracy_mean: f64,
        cv_accuracy_std: f64,
        fold_accuracies: &[f64],
        class_labels: &[String],
        confusion_matrix: &[Vec<usize>],
        class_metrics: &[(f64, f64, f64, usize)],
    ) -> Result<PathBuf, IoError> {
        let classes: Vec<ClassEntry> = class_labels
            .iter()
            .zip(class_metrics)
            .map(|(label, &(precision, recall, f1, support))| ClassEntry {
                label: label.as_str(),
                precision,
                recall,
                f1,
                support,
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            n_trees,
            cv_accuracy_mean,
            cv_accuracy_std,
            fold_accuracies,
            class_labels,
            confusion_matrix,
            class_metrics: classes,
        };

        let path = self.write_json("evaluate", &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    /// Write per-query verdicts to `{experiment}_classify.json`.
    ///
    /// Each entry is `(verdict, votes)`, where `votes[i]` is the label
    /// predicted by ensemble member `i`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_classification(
        &self,
        n_trees: usize,
        predictions: &[(String, Vec<String>)],
    ) -> Result<PathBuf, IoError> {
        let entries: Vec<PredictionEntry> = predictions
            .iter()
            .enumerate()
            .map(|(row, (verdict, votes))| PredictionEntry {
                row,
                verdict: verdict.as_str(),
                votes,
            })
            .collect();

        let artifact = ClassifyArtifact {
            experiment: self.experiment.as_str(),
            n_trees,
            n_queries: predictions.len(),
            predictions: entries,
        };

        let path = self.write_json("classify", &artifact)?;
        info!(path = %path.display(), "classification result written");
        Ok(path)
    }

    fn write_json(&self, kind: &str, artifact: &impl Serialize) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()));

        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    n_trees: usize,
    cv_accuracy_mean: f64,
    cv_accuracy_std: f64,
    fold_accuracies: &'a [f64],
    class_labels: &'a [String],
    confusion_matrix: &'a [Vec<usize>],
    class_metrics: Vec<ClassEntry<'a>>,
}

#[derive(Serialize)]
struct ClassEntry<'a> {
    label: &'a str,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

#[derive(Serialize)]
struct ClassifyArtifact<'a> {
    experiment: &'a str,
    n_trees: usize,
    n_queries: usize,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    row: usize,
    verdict: &'a str,
    votes: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn write_evaluation_json_structure() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("eval_test".into()).unwrap();
        let writer = ResultWriter::new(dir.path(), experiment).unwrap();

        let labels = vec!["no".to_string(), "yes".to_string()];
        let path = writer
            .write_evaluation(
                10,
                0.9,
                0.05,
                &[0.85, 0.95],
                &labels,
                &[vec![9, 1], vec![1, 9]],
                &[(0.9, 0.9, 0.9, 10), (0.9, 0.9, 0.9, 10)],
            )
            .unwrap();

        assert_eq!(path, dir.path().join("eval_test_evaluate.json"));
        let content = read_json(&path);
        assert_eq!(content["experiment"], "eval_test");
        assert_eq!(content["n_trees"], 10);
        assert_eq!(content["fold_accuracies"].as_array().unwrap().len(), 2);
        assert_eq!(content["class_labels"][1], "yes");
        assert_eq!(content["confusion_matrix"][0][1], 1);
        assert_eq!(content["class_metrics"][0]["label"], "no");
        assert_eq!(content["class_metrics"][1]["support"], 10);
    }

    #[test]
    fn write_classification_json_structure() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("cls_test".into()).unwrap();
        let writer = ResultWriter::new(dir.path(), experiment).unwrap();

        let predictions = vec![
            ("a".to_string(), vec!["a".to_string(), "a".to_string(), "b".to_string()]),
            ("b".to_string(), vec!["b".to_string(), "a".to_string(), "b".to_string()]),
        ];
        let path = writer.write_classification(3, &predictions).unwrap();

        let content = read_json(&path);
        assert_eq!(content["n_queries"], 2);
        let entries = content["predictions"].as_array().unwrap();
        assert_eq!(entries[1]["row"], 1);
        assert_eq!(entries[1]["verdict"], "b");
        assert_eq!(entries[0]["votes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn writer_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("deep");
        let experiment = ExperimentName::new("nested_test".into()).unwrap();
        let writer = ResultWriter::new(&nested, experiment).unwrap();
        writer.write_classification(1, &[]).unwrap();
        assert!(nested.join("nested_test_classify.json").exists());
    }

    #[test]
    fn invalid_experiment_name_rejected() {
        let result = ExperimentName::new("bad name!".into());
        assert!(matches!(result, Err(IoError::InvalidExperimentName { .. })));
    }
}
