//! alphafeed binary: single pipeline pass by default, interval daemon with
//! `--daemon`. Everything else is configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use alphafeed::config;
use alphafeed::ingest::providers_from_config;
use alphafeed::insight::reasoning::build_client;
use alphafeed::insight::ThreadRngJitter;
use alphafeed::{pipeline, scheduler};

#[derive(Parser, Debug)]
#[command(
    name = "alphafeed",
    version,
    about = "Financial news pipeline: fetch, filter, score, snapshot."
)]
struct Args {
    /// Keep running on the configured interval instead of a single pass.
    #[arg(long)]
    daemon: bool,

    /// Override the daemon interval in seconds.
    #[arg(long, value_name = "SECS")]
    interval_secs: Option<u64>,

    /// Cap on articles emitted per run.
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Config file (default: $ALPHAFEED_CONFIG, then config/alphafeed.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Snapshot output path override.
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(p) => config::load_from(p)?,
        None => config::load_default()?,
    };
    if let Some(secs) = args.interval_secs {
        cfg.schedule.interval_secs = secs;
    }
    if let Some(p) = args.snapshot {
        cfg.snapshot.path = p;
    }

    let reasoning = build_client(&cfg.reasoning);

    if args.daemon {
        scheduler::run_forever(cfg, reasoning, args.limit).await
    } else {
        let providers = providers_from_config(&cfg.sources, &cfg.fetch)?;
        let mut jitter = ThreadRngJitter;
        let summary =
            pipeline::run_once(&cfg, providers, reasoning.as_ref(), &mut jitter, args.limit)
                .await?;
        tracing::info!(
            admitted = summary.counts.admitted,
            wrote_snapshot = summary.wrote_snapshot,
            "single run finished"
        );
        Ok(())
    }
}
