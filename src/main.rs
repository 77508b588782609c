//! ledger-crawl main entry point
//!
//! This is the command-line interface for the ledger-crawl page fetcher.

use anyhow::{anyhow, Context};
use clap::Parser;
use ledger_crawl::browser::launch_session;
use ledger_crawl::config::{load_config_with_hash, validate, Config};
use ledger_crawl::crawl;
use ledger_crawl::crawler::{watch_interrupts, InterruptOutcome};
use ledger_crawl::output::{load_progress, print_progress, print_summary};
use ledger_crawl::storage::{open_ledger, CompletedStore};
use ledger_crawl::url::{filename_for, load_url_list, pending_urls};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Exit status for anything that stops the run before it starts
const EXIT_STARTUP_FAILURE: u8 = 1;

/// Exit status after a second Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

/// ledger-crawl: a resumable, block-aware page fetcher
///
/// ledger-crawl fetches every URL in a list through a browser, stores the
/// rendered HTML, and records each success in a ledger so reruns resume.
/// The whole run halts as soon as the target starts blocking requests.
#[derive(Parser, Debug)]
#[command(name = "ledger-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A resumable, block-aware page fetcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the number of parallel workers (raises block risk)
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Validate config and show what would be fetched without launching a browser
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show ledger progress against the URL list and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_STARTUP_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(workers) = cli.workers {
        config.crawler.max_workers = workers;
        validate(&config).context("Invalid --workers override")?;
    }

    // Only a real crawl writes the persistent log
    let log_file = (!cli.dry_run && !cli.status).then(|| config.output.log_file.as_path());
    let _guard = setup_logging(cli.verbose, cli.quiet, log_file)?;

    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("No configuration file given, using defaults"),
    }

    if cli.dry_run {
        handle_dry_run(&config).await?;
        Ok(0)
    } else if cli.status {
        handle_status(&config).await?;
        Ok(0)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up console and file logging based on verbosity level
///
/// `RUST_LOG` overrides the console filter when set. The file sink always
/// records at least info level so every attempt and retry is auditable.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let console_filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        verbosity_filter(verbose, quiet)
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(console_filter);

    let (file, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("Log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(verbosity_filter(verbose, false));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();

    Ok(guard)
}

fn verbosity_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        // Only show errors
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::new("ledger_crawl=info,warn"),
        1 => EnvFilter::new("ledger_crawl=debug,info"),
        2 => EnvFilter::new("ledger_crawl=trace,debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== ledger-crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.max_workers);
    println!("  Attempts per URL: {}", config.crawler.max_attempts);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    println!(
        "  Navigation timeout: {}ms",
        config.crawler.navigation_timeout_ms
    );
    println!(
        "  Settle wait: {}-{}ms",
        config.crawler.min_wait_ms, config.crawler.max_wait_ms
    );

    println!("\nBrowser:");
    println!("  Backend: {:?}", config.browser.backend);
    println!("  Incognito: {}", config.browser.incognito);
    println!("  Headless: {}", config.browser.headless);

    println!("\nDetection:");
    println!("  Marker tag: <{}>", config.detection.marker_tag);
    println!("  Block keywords: {}", config.detection.block_keywords.len());

    println!("\nFiles:");
    println!("  URL list: {}", config.input.url_list.display());
    println!("  Save dir: {}", config.output.save_dir.display());
    println!("  Ledger: {}", config.output.completed_ledger.display());
    println!("  Log: {}", config.output.log_file.display());

    let universe = load_url_list(&config.input.url_list)?;
    let completed = open_ledger(&config.output.completed_ledger).load().await?;
    let pending = pending_urls(&universe, &completed);

    println!("\nPending URLs ({}):", pending.len());
    for url in &pending {
        println!("  - {} -> {}", url, filename_for(url));
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch {} of {} URLs ({} already completed)",
        pending.len(),
        universe.len(),
        universe.len() - pending.len()
    );

    Ok(())
}

/// Handles the --status mode: shows ledger progress
async fn handle_status(config: &Config) -> anyhow::Result<()> {
    println!("Ledger: {}\n", config.output.completed_ledger.display());

    let universe = load_url_list(&config.input.url_list)?;
    let ledger = open_ledger(&config.output.completed_ledger);
    let progress = load_progress(&universe, &ledger).await?;

    print_progress(&progress);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<u8> {
    let session = launch_session(&config.browser)
        .await
        .context("Failed to start browser session")?;

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        let outcome = watch_interrupts(tokio::signal::ctrl_c, watcher).await;
        if outcome == InterruptOutcome::Forced {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let summary = crawl(&config, session, cancel).await?;

    tracing::info!("{}", summary.summary_line());
    print_summary(&summary);

    Ok(summary.exit_code())
}
