//! detect - infer violations for one frame from recorded detector output

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use violation_sort::{Analyzer, Config, Detector, FrameRef, ReplayDetector};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Recorded primary detector output, keyed by frame id.
    #[arg(long)]
    detections: PathBuf,
    /// Frame id to analyze.
    #[arg(long)]
    frame: String,
    /// Recorded guard-item detector output. Without it guard items come
    /// from the primary detections.
    #[arg(long)]
    guard_detections: Option<PathBuf>,
    /// Treat the guard-item detector as unavailable.
    #[arg(long, default_value_t = false)]
    no_guard: bool,
    /// TOML configuration file.
    #[arg(long, env = "VIOLATION_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };

    let primary = ReplayDetector::from_path(&args.detections)
        .map_err(|e| anyhow!("failed to load {}: {}", args.detections.display(), e))?;
    let guard: Option<Box<dyn Detector>> = match args.guard_detections.as_deref() {
        Some(path) => {
            let guard = ReplayDetector::from_path(path)
                .map_err(|e| anyhow!("failed to load {}: {}", path.display(), e))?;
            Some(Box::new(guard) as Box<dyn Detector>)
        }
        None => None,
    };

    log::info!("detect starting");
    log::info!("  frame: {}", args.frame);
    log::info!("  primary detector: {}", primary.name());

    let mut analyzer = Analyzer::new(config, Box::new(primary), guard)?;
    let frame = FrameRef::by_id(&args.frame);

    let report = if args.no_guard {
        analyzer.analyze_without_guard(&frame)?
    } else {
        analyzer.analyze(&frame)?
    };
    analyzer.release();

    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
