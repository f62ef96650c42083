use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use grove_io::{ExperimentName, LabelEncoding, ResultWriter, SampleReader};
use grove_tree::{
    CostFunction, CrossValidation, DataSet, ForestConfig, ParallelProcessor, Processor, Scheduler,
    SequentialProcessor, vote,
};

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Bagged decision-tree ensembles with parallel evaluation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of worker threads (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input file options shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Path to the training CSV file (features, then the label column)
    #[arg(long)]
    data: PathBuf,

    /// Treat the first row of every CSV file as a header
    #[arg(long, default_value_t = false)]
    header: bool,
}

/// Ensemble construction parameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the ensemble
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Maximum tree depth (the root split is depth 1)
    #[arg(long, default_value_t = 10)]
    max_depth: usize,

    /// Subset size at or below which a node becomes a leaf
    #[arg(long, default_value_t = 1)]
    min_size: usize,

    /// Share of the training set drawn with replacement for each tree
    #[arg(long, default_value_t = 1.0)]
    resample_ratio: f64,

    /// Random candidate features per split (omit for plain bagging)
    #[arg(long)]
    features_per_split: Option<usize>,

    /// Split cost function: "gini" or "entropy"
    #[arg(long, default_value = "gini")]
    cost: String,
}

/// Where result files go.
#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: Option<String>,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Cross-validate a forest on a labeled CSV file
    Evaluate {
        #[command(flatten)]
        input: DataArgs,

        /// Number of cross-validation folds
        #[arg(long, default_value_t = 5)]
        folds: usize,

        #[command(flatten)]
        forest: ForestArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Train a forest and classify every row of a query CSV file
    Classify {
        #[command(flatten)]
        input: DataArgs,

        /// Path to the query CSV file (features, optionally followed by a label)
        #[arg(long)]
        query: PathBuf,

        /// Evaluate the ensemble with the fork-join processor
        #[arg(long, default_value_t = false)]
        parallel: bool,

        #[command(flatten)]
        forest: ForestArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

// --- Stdout output structs ---

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: Option<String>,
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    n_trees: usize,
    n_folds: usize,
    cv_mean_accuracy: f64,
    cv_std_accuracy: f64,
    fold_accuracies: Vec<f64>,
}

#[derive(Serialize)]
struct ClassifyOutput {
    experiment: Option<String>,
    n_trees: usize,
    processor: &'static str,
    predictions: Vec<QueryOutput>,
}

#[derive(Serialize)]
struct QueryOutput {
    row: usize,
    verdict: String,
    votes: Vec<String>,
}

fn parse_cost(s: &str) -> Result<CostFunction> {
    match s {
        "gini" => Ok(CostFunction::Gini),
        "entropy" => Ok(CostFunction::Entropy),
        other => bail!("unknown cost function \"{other}\": expected \"gini\" or \"entropy\""),
    }
}

fn forest_config(args: &ForestArgs, seed: u64) -> Result<ForestConfig> {
    Ok(ForestConfig::new(args.trees)?
        .with_max_depth(args.max_depth)
        .with_min_size(args.min_size)
        .with_resample_ratio(args.resample_ratio)
        .with_features_per_split(args.features_per_split)
        .with_cost(parse_cost(&args.cost)?)
        .with_seed(seed))
}

fn load_training_set(path: &Path, header: bool) -> Result<(DataSet, LabelEncoding)> {
    let table = SampleReader::new(path)
        .with_headers(header)
        .read()
        .context("failed to read training CSV")?;
    if let Some(names) = table.feature_names() {
        debug!(features = ?names, "feature columns from header");
    }
    let encoding = table.label_encoding().clone();
    let data = DataSet::new(table.into_rows()).context("invalid training set")?;
    info!(
        n_samples = data.len(),
        n_features = data.n_features(),
        n_classes = data.n_classes(),
        "training set loaded"
    );
    Ok((data, encoding))
}

fn result_writer(output: &OutputArgs) -> Result<Option<ResultWriter>> {
    output
        .experiment
        .as_ref()
        .map(|name| -> Result<ResultWriter> {
            let experiment = ExperimentName::new(name.clone())?;
            Ok(ResultWriter::new(&output.output_dir, experiment)?)
        })
        .transpose()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let scheduler = Scheduler::new(cli.threads.unwrap_or(0))
        .context("failed to configure worker pool")?;
    info!(threads = scheduler.n_threads(), "worker pool configured");

    match cli.command {
        Command::Evaluate {
            input,
            folds,
            forest,
            output,
        } => {
            let writer = result_writer(&output)?;
            let (data, encoding) = load_training_set(&input.data, input.header)?;
            let config = forest_config(&forest, cli.seed)?;

            let cv_result = CrossValidation::new(folds)?
                .with_seed(cli.seed)
                .evaluate(&config, &data, &scheduler)
                .context("cross-validation failed")?;

            if let Some(writer) = &writer {
                let cm = &cv_result.confusion_matrix;
                let class_labels: Vec<String> =
                    cm.labels().iter().map(|&l| encoding.decode(l)).collect();
                let class_metrics: Vec<(f64, f64, f64, usize)> = cm
                    .class_metrics()
                    .iter()
                    .map(|m| (m.precision, m.recall, m.f1, m.support))
                    .collect();
                writer.write_evaluation(
                    config.ensemble_size(),
                    cv_result.mean_accuracy,
                    cv_result.std_accuracy,
                    &cv_result.fold_accuracies,
                    &class_labels,
                    cm.as_rows(),
                    &class_metrics,
                )?;
            }

            let output = EvaluateOutput {
                experiment: output.experiment,
                n_samples: cv_result.n_samples,
                n_features: cv_result.n_features,
                n_classes: cv_result.n_classes,
                n_trees: config.ensemble_size(),
                n_folds: cv_result.n_folds,
                cv_mean_accuracy: cv_result.mean_accuracy,
                cv_std_accuracy: cv_result.std_accuracy,
                fold_accuracies: cv_result.fold_accuracies,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Classify {
            input,
            query,
            parallel,
            forest,
            output,
        } => {
            let writer = result_writer(&output)?;
            let (data, encoding) = load_training_set(&input.data, input.header)?;
            let queries = SampleReader::new(&query)
                .with_headers(input.header)
                .read_queries(data.n_features())
                .context("failed to read query CSV")?;

            let config = forest_config(&forest, cli.seed)?;
            let trained = config
                .fit(&data, &scheduler)
                .context("forest training failed")?;

            let (processor, processor_name) = if parallel {
                (
                    Processor::Parallel(ParallelProcessor::new(scheduler.clone())),
                    "parallel",
                )
            } else {
                (Processor::Sequential(SequentialProcessor), "sequential")
            };

            let mut predictions = Vec::with_capacity(queries.len());
            for (row, q) in queries.iter().enumerate() {
                let votes = trained
                    .votes(q, &processor)
                    .with_context(|| format!("failed to evaluate query row {row}"))?;
                let verdict = vote::majority(&votes)
                    .with_context(|| format!("no votes for query row {row}"))?;
                predictions.push((
                    encoding.decode(verdict),
                    votes.iter().map(|&v| encoding.decode(v)).collect::<Vec<_>>(),
                ));
            }
            info!(n_queries = predictions.len(), processor = processor_name, "queries classified");

            if let Some(writer) = &writer {
                writer.write_classification(trained.n_trees(), &predictions)?;
            }

            let output = ClassifyOutput {
                experiment: output.experiment,
                n_trees: trained.n_trees(),
                processor: processor_name,
                predictions: predictions
                    .into_iter()
                    .enumerate()
                    .map(|(row, (verdict, votes))| QueryOutput {
                        row,
                        verdict,
                        votes,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
