//! Tululu-Scraper main entry point
//!
//! This is the command-line interface for downloading a range of books.

use anyhow::Context as _;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tululu_scraper::config::{load_config, Config, ExhaustionPolicy};
use tululu_scraper::crawler::scrape_range;
use tululu_scraper::FAILURE_LOG_TARGET;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Tululu-Scraper: download books from https://tululu.org/
///
/// Fetches the text, cover and metadata of every book id in
/// [START_ID, END_ID). Missing books are skipped; failures are appended to
/// the error log.
#[derive(Parser, Debug)]
#[command(name = "tululu-scraper")]
#[command(version)]
#[command(about = "Download books from https://tululu.org/", long_about = None)]
struct Cli {
    /// First book id to download
    #[arg(value_name = "START_ID", default_value_t = 1)]
    start_id: u32,

    /// Book id to stop at (exclusive)
    #[arg(value_name = "END_ID", default_value_t = 10)]
    end_id: u32,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip books that exhaust their retries instead of stopping the run
    #[arg(long)]
    continue_on_exhausted: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match try_main(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if cli.continue_on_exhausted {
        config.run.on_exhausted = ExhaustionPolicy::Continue;
    }

    setup_logging(cli.verbose, cli.quiet, Path::new(&config.output.error_log))
        .context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    let summary = scrape_range(&config, cli.start_id, cli.end_id).await?;
    tracing::debug!(?summary, "run complete");

    Ok(())
}

/// Sets up console and error-log tracing layers
///
/// The console layer follows the verbosity flags and never shows per-book
/// failures. The error-log layer appends every error, plus warnings on the
/// failure target, to `error_log`.
fn setup_logging(verbose: u8, quiet: bool, error_log: &Path) -> anyhow::Result<()> {
    let console_filter = if quiet {
        EnvFilter::new(format!("error,{FAILURE_LOG_TARGET}=off"))
    } else {
        match verbose {
            0 => EnvFilter::new(format!("warn,{FAILURE_LOG_TARGET}=off")),
            1 => EnvFilter::new(format!("tululu_scraper=info,warn,{FAILURE_LOG_TARGET}=off")),
            2 => EnvFilter::new(format!("tululu_scraper=debug,info,{FAILURE_LOG_TARGET}=off")),
            _ => EnvFilter::new("trace"),
        }
    };

    if let Some(parent) = error_log.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(error_log)
        .with_context(|| format!("open error log {}", error_log.display()))?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(console_filter);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(EnvFilter::new(format!("error,{FAILURE_LOG_TARGET}=warn")));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
