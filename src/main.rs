//! Catalog Grabber main entry point
//!
//! This is the command-line interface for the catalog asset downloader.

use catalog_grabber::config::{load_config_with_hash, load_credentials, Config};
use catalog_grabber::crawler::{run_crawl, RunOptions};
use catalog_grabber::output::print_statistics;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Catalog Grabber: download every video and cover from a catalog
///
/// Reads the catalog listing, visits every detail page, and stores each
/// entry's videos and cover images under `<download-root>/<site-name>/<title>/`.
/// Files already on disk are skipped, so interrupted runs can simply be
/// started again.
#[derive(Parser, Debug)]
#[command(name = "catalog-grabber")]
#[command(version)]
#[command(about = "Resumable video and cover downloader for catalog sites", long_about = None)]
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

    /// Resolve every entry and show what would be downloaded, without downloading
    #[arg(long)]
    dry_run: bool,

    /// Process at most this many catalog entries
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Also append log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let credentials = load_credentials(&config)?;
    tracing::info!("Loaded {} session cookies", credentials.len());

    let options = RunOptions {
        dry_run: cli.dry_run,
        limit: cli.limit,
    };

    handle_run(config, &credentials, options, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_grabber=info,warn"),
            1 => EnvFilter::new("catalog_grabber=debug,info"),
            2 => EnvFilter::new("catalog_grabber=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the main crawl operation
async fn handle_run(
    config: Config,
    credentials: &catalog_grabber::Credentials,
    options: RunOptions,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if options.dry_run {
        tracing::info!("Dry run: nothing will be downloaded");
    }
    tracing::info!(
        "Catalog: {} -> {}/{}",
        config.crawler.catalog_url,
        config.output.download_root,
        config.crawler.site_name
    );

    match run_crawl(config, credentials, options).await {
        Ok(report) => {
            if !quiet {
                print_statistics(&report.statistics);
                if let Some(path) = &report.manifest_path {
                    println!("\nManifest: {}", path.display());
                }
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run aborted: {}", e);
            Err(e.into())
        }
    }
}
