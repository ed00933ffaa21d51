use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::ScanConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Runs the arcscan core against a simulated ranging sensor")]
struct Args {
    /// Load a scan config from YAML; the scan flags below are then ignored
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "PROF_SENSOR")]
    profile: String,
    #[arg(long, default_value = "FILTER_TYPE_MTI")]
    filter: String,
    /// arc, scatter3d or raw_heatmap
    #[arg(long, default_value = "arc")]
    mode: String,
    #[arg(long, default_value_t = 20)]
    cycles: usize,
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,
    /// Number of simulated targets
    #[arg(long)]
    targets: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Write every presented scene to this file as JSON lines
    #[arg(long)]
    record: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = &args.config {
        ScanConfig::load(path)?
    } else {
        ScanConfig::from_args(
            &args.profile,
            &args.filter,
            &args.mode,
            args.cycles,
            args.interval_ms,
        )?
    };
    if let Some(targets) = args.targets {
        config.sensor.targets = targets;
    }
    if let Some(seed) = args.seed {
        config.sensor.seed = seed;
    }

    let mut runner = Runner::new(config);
    if let Some(path) = args.record {
        runner = runner.with_recording(path);
    }

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating scan runtime")?;
    let summary = runtime.block_on(runner.execute())?;

    println!(
        "Scan finished -> cycles {}, errors {}, calibration triggers {}, scenes {} (recorded {}){}",
        summary.metrics.cycles,
        summary.metrics.cycle_errors,
        summary.metrics.calibration_triggers,
        summary.bridge.total_scenes(),
        summary.bridge.recorded,
        if summary.interrupted { ", interrupted" } else { "" }
    );
    println!(
        "Views -> arc {}, scatter3d {}, raw_heatmap {}, resets {}; session {}",
        summary.bridge.arc_scenes,
        summary.bridge.scatter_scenes,
        summary.bridge.raw_scenes,
        summary.bridge.resets,
        summary.final_state
    );
    if let Some(status) = summary.last_status {
        println!("Last status: {}", status);
    }
    Ok(())
}
