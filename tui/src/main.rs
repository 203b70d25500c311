use std::fs::OpenOptions;
use std::sync::Mutex;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Error tracing
use anyhow::{Context, Result};

use sisweek::app::App;
use shared::config::load_or_default;

/// Terminal client for SisWeek event attendance.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "sisweek.toml")]
    config: String,

    /// Log filter, e.g. `info` or `sisweek=debug`. `RUST_LOG` wins when set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log file; overrides `paths.log_file`
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_or_default(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;

    // The terminal belongs to the UI, so logs go to a file.
    let log_path = args.log_file.unwrap_or_else(|| config.paths.log_file.clone());
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    info!("Starting sisweek {}", env!("CARGO_PKG_VERSION"));

    let (tx, rx) = mpsc::unbounded_channel();
    let mut app = App::new(&config, tx);
    app.restore_session();

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal, rx).await;
    ratatui::restore();

    result.context("Terminal session failed")
}
