use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jsonwatch::{Dashboard, TextRenderer};

#[derive(Parser, Debug)]
#[command(name = "jsonwatch")]
#[command(about = "Poll JSON metric endpoints and print ranked time series")]
struct Args {
    /// Path to the dashboard file (TOML or JSON)
    #[arg(short, long, default_value = "dashboard.toml")]
    config: PathBuf,

    /// Override the dashboard's polling interval, in milliseconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Poll every source once, print the results, and exit
    #[arg(long)]
    once: bool,

    /// Log filter (e.g. "info", "jsonwatch=debug")
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log)?)
        .init();

    let mut dashboard = Dashboard::load(&args.config)?;
    if let Some(ms) = args.interval {
        dashboard.interval_ms = Some(ms);
    }

    let watcher = dashboard.into_watcher(TextRenderer)?;

    if args.once {
        watcher.tick_once().await;
        return Ok(());
    }

    watcher.start();
    tokio::signal::ctrl_c().await?;
    watcher.stop();

    Ok(())
}
