//! evaluate - score detector predictions against COCO-like ground truth

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use violation_sort::evaluation::dataset;
use violation_sort::{Config, Evaluator, MatchStrategy};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Ground-truth annotations file.
    #[arg(long, default_value = "datasets/test/annotations.json")]
    annotations: PathBuf,
    /// Predictions file.
    #[arg(long, default_value = "results/predictions.json")]
    predictions: PathBuf,
    /// Minimum IoU for a match; overrides the configuration.
    #[arg(long)]
    iou_threshold: Option<f32>,
    /// Matching strategy (input_order|confidence_sorted|optimal); overrides the configuration.
    #[arg(long, value_name = "STRATEGY")]
    strategy: Option<MatchStrategy>,
    /// TOML configuration file.
    #[arg(long, env = "VIOLATION_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };
    if let Some(threshold) = args.iou_threshold {
        config.evaluation.iou_threshold = threshold;
    }
    if let Some(strategy) = args.strategy {
        config.evaluation.strategy = strategy;
    }
    config.validate()?;

    let annotations = dataset::load_annotations(&args.annotations)
        .map_err(|e| anyhow!("failed to load {}: {}", args.annotations.display(), e))?;
    let predictions = dataset::load_predictions(&args.predictions)
        .map_err(|e| anyhow!("failed to load {}: {}", args.predictions.display(), e))?;

    log::info!(
        "loaded {} annotation(s), {} prediction(s)",
        annotations.len(),
        predictions.len()
    );

    let evaluation = Evaluator::from_config(&config).evaluate(&annotations, &predictions)?;

    println!("{}", evaluation.summary);
    Ok(())
}
