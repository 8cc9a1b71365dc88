//! Feed-Tide main entry point
//!
//! This is the command-line interface for the Feed-Tide feed harvester.

use anyhow::Context;
use clap::Parser;
use feed_tide::config::{load_config_with_hash, Config};
use feed_tide::crawler::{run_harvest, select_targets};
use feed_tide::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Feed-Tide: an incremental social-feed harvester
///
/// Feed-Tide drives a browser over group and page feeds, reads every post
/// (author, time, text, link, comments, images) and stores the records in
/// SQLite alongside the saved screenshots.
#[derive(Parser, Debug)]
#[command(name = "feed-tide")]
#[command(version)]
#[command(about = "An incremental social-feed harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show which feeds would be harvested
    #[arg(long)]
    dry_run: bool,

    /// Harvest only the target with this name
    #[arg(long, value_name = "NAME")]
    only: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.only.as_deref())
    } else {
        handle_harvest(config, &config_hash, cli.only.as_deref(), cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feed_tide=info,warn"),
            1 => EnvFilter::new("feed_tide=debug,info"),
            2 => EnvFilter::new("feed_tide=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the resolved feeds
fn handle_dry_run(config: &Config, only: Option<&str>) -> anyhow::Result<()> {
    let targets = select_targets(config, only)?;
    let base_url = Url::parse(&config.session.base_url)?;

    println!("=== Feed-Tide Dry Run ===\n");

    println!("Session:");
    println!("  Base URL: {}", config.session.base_url);
    println!("  Wait timeout: {}ms", config.session.wait_timeout_ms);
    println!(
        "  Delays: settle {}ms, scroll {}ms, action {}ms",
        config.session.settle_delay_ms,
        config.session.scroll_delay_ms,
        config.session.action_delay_ms
    );
    println!("  Attempt scope: {:?}", config.session.attempt_scope);

    println!("\nLimits:");
    println!("  Traversal: {:?}", config.limits.traversal);
    println!(
        "  Chunk size: {} (+{} margin)",
        config.limits.chunk_size, config.limits.chunk_margin
    );
    println!("  Max attempts: {}", config.limits.max_attempts);
    match config.limits.max_scroll_depth {
        Some(depth) => println!("  Max scroll depth: {}", depth),
        None => println!("  Max scroll depth: unbounded"),
    }
    println!("  Max comments: {}", config.limits.max_comments);
    println!("  Max images: {}", config.limits.max_images);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  Images: {}", config.output.images_folder);
    println!("  Thumbnails: {}", config.output.thumbnails_folder);

    println!("\nTargets ({}):", targets.len());
    for target in &targets {
        println!(
            "  - {} [{}] {}",
            target.name,
            target.kind,
            target.url(&base_url)?
        );
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    config_hash: &str,
    only: Option<&str>,
    quiet: bool,
) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} configured targets ({:?} traversal)",
        config.targets.len(),
        config.limits.traversal
    );

    let stats = run_harvest(config, config_hash, only)
        .await
        .context("Harvest failed")?;

    if !quiet {
        print_statistics(&stats);
    }
    if stats.failed_targets() > 0 {
        tracing::warn!("{} targets stopped early", stats.failed_targets());
    }
    Ok(())
}
