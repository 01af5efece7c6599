//! Emotion Detection Service - Main Entry Point
//!
//! Reads `DETECT` / `QUIT` from stdin, answers on stdout, logs on stderr.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use emotion_service::{build_monitor, init_logging, CommandLoop, ServiceConfig};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "emotion-service", version, about = "Camera-based wellbeing detection service")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ServiceConfig::load(args.config.as_deref()).context("loading configuration")?;
    init_logging(&config.log)?;

    info!("=== Emotion Service v{} ===", env!("CARGO_PKG_VERSION"));
    let monitor = build_monitor(&config).context("initializing detection models")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let exit = CommandLoop::new(monitor).run(stdin.lock(), stdout.lock())?;
    info!("Command loop finished: {:?}", exit);

    Ok(())
}
