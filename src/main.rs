//! Sig-Census main entry point
//!
//! This is the command-line interface for the Sig-Census signature crawler.

use anyhow::Context;
use clap::Parser;
use sig_census::bins::{bins_fingerprint, generate_bins};
use sig_census::checkpoint::CheckpointStore;
use sig_census::config::{load_config, Config};
use sig_census::crawler::{run_census, CrawlOutcome, ResumePolicy};
use sig_census::output::{print_checkpoint_status, print_summary};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sig-Census: a resumable code search census
///
/// Sig-Census enumerates every repository matching two signatures through a
/// paginated search API, checkpointing after every size bin so an interrupted
/// run can pick up where it stopped, then writes the repositories that match
/// the first signature but not the second.
#[derive(Parser, Debug)]
#[command(name = "sig-census")]
#[command(version)]
#[command(about = "A resumable code search census", long_about = None)]
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

    /// Resume an interrupted run without asking
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Discard any checkpoint and start over
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show the bin layout without querying anything
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show what the checkpoint holds and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,

    /// API token for the search service
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.status {
        handle_status(&config)?;
    } else {
        let policy = if cli.resume {
            ResumePolicy::Always
        } else if cli.fresh {
            ResumePolicy::Never
        } else {
            ResumePolicy::Ask
        };
        handle_crawl(config, cli.token.as_deref(), policy).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sig_census=info,warn"),
            1 => EnvFilter::new("sig_census=debug,info"),
            2 => EnvFilter::new("sig_census=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be queried
fn handle_dry_run(config: &Config) {
    let bins = generate_bins(&config.bins);

    println!("=== Sig-Census Dry Run ===\n");

    println!("Signatures:");
    println!("  Set A: {}", config.signatures.set_a);
    println!("  Set B: {}", config.signatures.set_b);

    println!("\nSearch:");
    println!("  Endpoint: {}", config.search.api_url);
    println!("  Per page: {}", config.search.per_page);
    println!("  Result cap: {}", config.search.result_cap);

    println!("\nThrottle:");
    println!("  Page delay: {}ms", config.throttle.page_delay_ms);
    println!(
        "  Rate-limit cooldown: {}ms",
        config.throttle.rate_limit_cooldown_ms
    );
    println!(
        "  Network retries: {} (backoff {}ms..{}ms)",
        config.throttle.network_max_retries,
        config.throttle.network_retry_delay_ms,
        config.throttle.network_retry_max_delay_ms
    );

    println!("\nBins ({}):", bins.len());
    for segment in &config.bins {
        println!(
            "  - {}..{} step {}",
            segment.start, segment.end, segment.step
        );
    }
    if let (Some(first), Some(last)) = (bins.first(), bins.last()) {
        println!("  First: {}  Last: {}", first, last);
    }
    println!("  Fingerprint: {}", bins_fingerprint(&bins));

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.checkpoint_path.display());
    println!("  Result: {}", config.output.result_path.display());

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would run {} queries per phase (at least one page each)",
        bins.len()
    );
}

/// Handles the --status mode: shows the checkpoint contents
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let store = CheckpointStore::new(config.output.checkpoint_path.clone());

    let state = store.read().context("checkpoint is unreadable")?;
    match state {
        Some(state) => {
            let bins = generate_bins(&config.bins);
            print_checkpoint_status(&state, bins.len(), &bins_fingerprint(&bins));
        }
        None => println!("No checkpoint at {}", store.path().display()),
    }

    Ok(())
}

/// Handles the main census run
async fn handle_crawl(
    config: Config,
    token: Option<&str>,
    policy: ResumePolicy,
) -> anyhow::Result<()> {
    if token.is_none() {
        tracing::warn!("No API token given; unauthenticated code search is heavily limited");
    }

    tracing::info!(
        "Set A: '{}', Set B: '{}'",
        config.signatures.set_a,
        config.signatures.set_b
    );

    let signatures = config.signatures.clone();
    let result_path = config.output.result_path.clone();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match run_census(config, token, policy, shutdown).await {
        Ok(CrawlOutcome::Completed(report)) => {
            print_summary(&report, &signatures);
            println!("\nSaved list to {}", result_path.display());
            tracing::info!("Census completed successfully");
            Ok(())
        }
        Ok(CrawlOutcome::Interrupted) => {
            println!("\nStopped by user. Progress saved; run again to resume.");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Census failed: {}", e);
            Err(e.into())
        }
    }
}
