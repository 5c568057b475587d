//! Drowsiness Monitor - Main Entry Point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use guard::{init_logging, run_replay, Settings, TraceRecording};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines recording of landmark model results
    #[arg(short, long)]
    trace: PathBuf,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    info!("=== Drowsy Guard v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    let trace = TraceRecording::open(&args.trace)
        .with_context(|| format!("reading trace {}", args.trace.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = run_replay(&settings, trace, &mut out).await?;

    info!(
        "Replay finished: {} frames observed, final state {}, {} alarm activations",
        summary.frames_observed, summary.final_state, summary.alarm_activations
    );
    Ok(())
}
