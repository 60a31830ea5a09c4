// src/main.rs

mod analyzer;
mod cli;
mod error;
mod extractor;
mod model;
mod pipeline;
mod publisher;
mod renderer;
mod watermark;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use cli::Args;
use error::ConfigError;
use pipeline::{Pipeline, RunSummary};
use publisher::{DiscordPublisher, DryRunPublisher, Publisher};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use watermark::WatermarkStore;

fn main() -> ExitCode {
    let args = Args::parse_or_exit();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("---- thumbnail-bot ----");
    tracing::info!("{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let store = WatermarkStore::new(args.state_path());

    let summary = if args.dry_run {
        let mut publisher = DryRunPublisher::default();
        let summary = execute(args, store, &mut publisher)?;
        tracing::info!("Dry run: {} collages left at {}", publisher.published, args.output_path().display());
        summary
    } else {
        let token = bot_token(args)?;
        execute(args, store, &mut DiscordPublisher::new(token, args.channel_id, args.api_base.as_str()))?
    };

    tracing::info!(
        "Finished in {:.2?}: {} repositories scanned, {} skipped, {} collages posted, {} failed",
        start_time.elapsed(),
        summary.repositories,
        summary.skipped,
        summary.collages,
        summary.publish_failures
    );
    Ok(())
}

/// The Discord token, rejected up front when missing or blank
fn bot_token(args: &Args) -> Result<String, ConfigError> {
    args.token.clone().filter(|t| !t.trim().is_empty()).ok_or(ConfigError::MissingToken)
}

fn execute<P: Publisher>(args: &Args, store: WatermarkStore, publisher: &mut P) -> Result<RunSummary> {
    Pipeline::new(&args.root, store, args.output_path(), publisher)
        .run()
        .with_context(|| format!("run over {} failed", args.root.display()))
}
