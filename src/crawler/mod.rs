//! Crawler module for the two-phase census
//!
//! This module contains the core crawling logic, including:
//! - Paging through one size bin with rate-limit and network retry handling
//! - Running one phase across every bin with per-bin checkpoints
//! - Orchestrating resume, both phases, and finalization

mod fetcher;
mod orchestrator;
mod phase;

pub use fetcher::{BinReport, BinStatus, PaginatedFetcher};
pub use orchestrator::{
    confirm_resume, CrawlOutcome, Orchestrator, ResumePlan, ResumePolicy, ResumePrompt, Stage,
    TerminalPrompt,
};
pub use phase::{build_query, PhaseRunner};

use crate::config::Config;
use crate::search::GithubSearch;
use crate::CensusError;
use std::future::Future;

/// Runs a complete census against the configured search API
///
/// This is the main entry point for starting a census. It will:
/// 1. Build the HTTP client
/// 2. Load any checkpoint and apply the resume policy
/// 3. Collect set A, then set B, checkpointing after every bin
/// 4. Write the A-only list and clear the checkpoint
///
/// # Arguments
///
/// * `config` - The census configuration
/// * `token` - Optional API token
/// * `policy` - What to do with an existing checkpoint
/// * `shutdown` - Resolves when the user asks to stop
///
/// # Example
///
/// ```no_run
/// use sig_census::config::Config;
/// use sig_census::crawler::{run_census, ResumePolicy};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let shutdown = async {
///     let _ = tokio::signal::ctrl_c().await;
/// };
/// run_census(Config::default(), None, ResumePolicy::Ask, shutdown).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_census<F>(
    config: Config,
    token: Option<&str>,
    policy: ResumePolicy,
    shutdown: F,
) -> Result<CrawlOutcome, CensusError>
where
    F: Future<Output = ()>,
{
    let backend = GithubSearch::new(&config.search, token)?;
    let orchestrator = Orchestrator::new(config, backend, policy);
    tracing::info!("Generated {} size bins", orchestrator.bins().len());
    orchestrator.run(shutdown).await
}
