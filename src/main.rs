//! CLI entry point for recsync.

use anyhow::Result;
use clap::Parser;
use recsync::{Config, Syncer};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("recsync starting");

    // Config problems are fatal before any network activity.
    let config = Config::load(&args.config)?;

    let syncer = Syncer::new(&config);

    // An aborted pass (no inventory) propagates as an error and a non-zero
    // exit; partial download failure does not, since forward progress was
    // still made.
    let summary = syncer.run().await?;

    info!(
        remote = summary.remote,
        new = summary.new,
        downloaded = summary.downloaded,
        failed = summary.failed,
        "synchronization pass finished"
    );

    Ok(())
}
