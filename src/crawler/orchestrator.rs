//! Crawl orchestrator - the two-phase state machine
//!
//! This module drives a whole census run:
//! - Loading any checkpoint and deciding whether to resume it
//! - Running phase A then phase B from the right bin
//! - Racing each phase against a shutdown signal
//! - Computing and writing the final set comparison
//! - Clearing the checkpoint once everything succeeded

use crate::bins::{bins_fingerprint, generate_bins, SizeBin};
use crate::checkpoint::{CheckpointStore, CrawlSets, CrawlState, Phase};
use crate::config::Config;
use crate::crawler::fetcher::PaginatedFetcher;
use crate::crawler::phase::PhaseRunner;
use crate::output::{write_result_list, CrawlReport, SetComparison};
use crate::search::SearchBackend;
use crate::CensusError;
use dialoguer::Confirm;
use std::future::Future;
use std::io::{self, BufRead, IsTerminal, Write};

const RESUME_QUESTION: &str = "Do you want to resume from this checkpoint?";

/// What to do when a checkpoint is found at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePolicy {
    /// Ask on the terminal
    Ask,
    /// Resume without asking
    Always,
    /// Discard the checkpoint and start fresh
    Never,
}

/// Where each phase starts and what it starts with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumePlan {
    pub start_a: usize,
    pub start_b: usize,
    pub sets: CrawlSets,
}

impl ResumePlan {
    /// A run from scratch
    pub fn fresh() -> Self {
        Self {
            start_a: 0,
            start_b: 0,
            sets: CrawlSets::new(),
        }
    }

    /// Resume rule for a checkpoint over `bin_count` bins
    ///
    /// - Interrupted in phase A: A continues after its last bin and B starts
    ///   at 0, since B cannot have begun before A finished.
    /// - Interrupted in phase B: A is complete (start at `bin_count`, so it is
    ///   skipped) and B continues after its last bin.
    pub fn from_checkpoint(state: CrawlState, bin_count: usize) -> Self {
        let next = state.last_bin_idx.saturating_add(1);
        match state.phase {
            Phase::A => Self {
                start_a: next,
                start_b: 0,
                sets: state.sets,
            },
            Phase::B => Self {
                start_a: bin_count,
                start_b: next,
                sets: state.sets,
            },
        }
    }
}

/// Asks whether a found checkpoint should be resumed
///
/// `layout_changed` is set when the checkpoint was written for a different bin
/// layout; resuming it will then fail, so the prompt should say so.
pub trait ResumePrompt: Send + Sync {
    fn confirm(&self, state: &CrawlState, layout_changed: bool) -> io::Result<bool>;
}

/// Prompt on the controlling terminal
///
/// Uses `dialoguer` when stdin is a terminal, and reads plain `y`/`n` lines
/// when input is piped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl ResumePrompt for TerminalPrompt {
    fn confirm(&self, state: &CrawlState, layout_changed: bool) -> io::Result<bool> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return confirm_resume(state, layout_changed, &mut stdin.lock(), &mut io::stdout());
        }

        let mut stdout = io::stdout();
        write_checkpoint_summary(state, layout_changed, &mut stdout)?;
        stdout.flush()?;

        let answer = Confirm::new()
            .with_prompt(RESUME_QUESTION)
            .default(true)
            .interact_opt()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        match answer {
            Some(true) => Ok(true),
            Some(false) => {
                println!("Starting fresh. Previous checkpoint will be discarded.");
                Ok(false)
            }
            None => Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "resume prompt dismissed",
            )),
        }
    }
}

/// States of a census run
#[derive(Debug)]
pub enum Stage {
    /// No checkpoint, or the user declined to resume
    Fresh,
    /// A checkpoint was found and awaits a resume decision
    ResumePending(CrawlState),
    /// Collecting set A
    PhaseA {
        start: usize,
        next_b: usize,
        sets: CrawlSets,
    },
    /// Collecting set B
    PhaseB { start: usize, sets: CrawlSets },
    /// Both sets collected
    Finalizing(CrawlSets),
    /// Output written; checkpoint about to be cleared
    Done(CrawlReport),
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Both phases ran and the result was written
    Completed(CrawlReport),
    /// Shutdown was requested; the last bin checkpoint is the recovery point
    Interrupted,
}

/// Top-level driver for a census run
pub struct Orchestrator<S> {
    config: Config,
    backend: S,
    store: CheckpointStore,
    fetcher: PaginatedFetcher,
    bins: Vec<SizeBin>,
    fingerprint: String,
    policy: ResumePolicy,
    prompt: Box<dyn ResumePrompt>,
}

impl<S: SearchBackend> Orchestrator<S> {
    /// Creates an orchestrator for `config` using `backend` for searches
    pub fn new(config: Config, backend: S, policy: ResumePolicy) -> Self {
        let bins = generate_bins(&config.bins);
        let fingerprint = bins_fingerprint(&bins);
        let store = CheckpointStore::new(config.output.checkpoint_path.clone());
        let fetcher = PaginatedFetcher::new(&config.search, &config.throttle);

        Self {
            config,
            backend,
            store,
            fetcher,
            bins,
            fingerprint,
            policy,
            prompt: Box::new(TerminalPrompt),
        }
    }

    /// Replaces the terminal prompt used under `ResumePolicy::Ask`
    pub fn with_prompt<P>(mut self, prompt: P) -> Self
    where
        P: ResumePrompt + 'static,
    {
        self.prompt = Box::new(prompt);
        self
    }

    /// The generated bin list
    pub fn bins(&self) -> &[SizeBin] {
        &self.bins
    }

    /// The checkpoint store in use
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Runs the census to completion or until `shutdown` resolves
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome::Completed)` - Both phases ran, output written, checkpoint cleared
    /// * `Ok(CrawlOutcome::Interrupted)` - Shutdown won; nothing further was written
    /// * `Err(CensusError)` - Checkpoint I/O, output, prompt, or bin layout failure
    pub async fn run<F>(&self, shutdown: F) -> Result<CrawlOutcome, CensusError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut stage = match self.store.load() {
            Some(state) => Stage::ResumePending(state),
            None => Stage::Fresh,
        };

        loop {
            tracing::debug!("Stage: {}", stage_name(&stage));

            stage = match stage {
                Stage::Fresh => {
                    let plan = ResumePlan::fresh();
                    Stage::PhaseA {
                        start: plan.start_a,
                        next_b: plan.start_b,
                        sets: plan.sets,
                    }
                }

                Stage::ResumePending(state) => {
                    let layout_changed = !state.matches_layout(&self.fingerprint);

                    if self.should_resume(&state, layout_changed)? {
                        if layout_changed {
                            return Err(CensusError::BinsChanged {
                                saved: state.bins_fingerprint.clone().unwrap_or_default(),
                                current: self.fingerprint.clone(),
                            });
                        }

                        tracing::info!(
                            "Resuming phase {} after bin {}",
                            state.phase,
                            state.last_bin_idx
                        );
                        let plan = ResumePlan::from_checkpoint(state, self.bins.len());
                        Stage::PhaseA {
                            start: plan.start_a,
                            next_b: plan.start_b,
                            sets: plan.sets,
                        }
                    } else {
                        tracing::info!("Starting fresh, discarding previous checkpoint");
                        self.store.clear()?;
                        Stage::Fresh
                    }
                }

                Stage::PhaseA {
                    start,
                    next_b,
                    sets,
                } => {
                    let runner = self.runner();
                    let phase = runner.run(Phase::A, &self.config.signatures.set_a, start, sets);
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => return Ok(self.interrupted()),
                        sets = phase => Stage::PhaseB { start: next_b, sets: sets? },
                    }
                }

                Stage::PhaseB { start, sets } => {
                    let runner = self.runner();
                    let phase = runner.run(Phase::B, &self.config.signatures.set_b, start, sets);
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => return Ok(self.interrupted()),
                        sets = phase => Stage::Finalizing(sets?),
                    }
                }

                Stage::Finalizing(sets) => Stage::Done(self.finalize(&sets)?),

                Stage::Done(report) => {
                    self.store.clear()?;
                    return Ok(CrawlOutcome::Completed(report));
                }
            };
        }
    }

    fn runner(&self) -> PhaseRunner<'_, S> {
        PhaseRunner::new(
            &self.backend,
            &self.fetcher,
            &self.store,
            &self.bins,
            &self.fingerprint,
        )
    }

    fn should_resume(
        &self,
        state: &CrawlState,
        layout_changed: bool,
    ) -> Result<bool, CensusError> {
        match self.policy {
            ResumePolicy::Always => Ok(true),
            ResumePolicy::Never => Ok(false),
            ResumePolicy::Ask => self
                .prompt
                .confirm(state, layout_changed)
                .map_err(CensusError::Prompt),
        }
    }

    fn interrupted(&self) -> CrawlOutcome {
        tracing::warn!(
            "Stopped by user. Progress up to the last completed bin is saved in {}",
            self.store.path().display()
        );
        CrawlOutcome::Interrupted
    }

    fn finalize(&self, sets: &CrawlSets) -> Result<CrawlReport, CensusError> {
        let comparison = SetComparison::compute(sets);
        let path = &self.config.output.result_path;

        write_result_list(path, &comparison.pure_a)?;
        tracing::info!(
            "Wrote {} identifiers to {}",
            comparison.pure_a.len(),
            path.display()
        );

        Ok(CrawlReport::new(sets, &comparison))
    }
}

fn stage_name(stage: &Stage) -> &'static str {
    match stage {
        Stage::Fresh => "FRESH",
        Stage::ResumePending(_) => "RESUME_PENDING",
        Stage::PhaseA { .. } => "PHASE_A_RUNNING",
        Stage::PhaseB { .. } => "PHASE_B_RUNNING",
        Stage::Finalizing(_) => "FINALIZING",
        Stage::Done(_) => "DONE",
    }
}

fn write_checkpoint_summary<W: Write>(
    state: &CrawlState,
    layout_changed: bool,
    output: &mut W,
) -> io::Result<()> {
    let rule = "=".repeat(50);
    writeln!(output)?;
    writeln!(output, "{}", rule)?;
    writeln!(output, "CHECKPOINT FOUND")?;
    writeln!(
        output,
        "Phase interrupted: {} (Completed bin index: {})",
        state.phase, state.last_bin_idx
    )?;
    writeln!(
        output,
        "Partial data saved - Set A: {} repos | Set B: {} repos",
        state.sets.set_a.len(),
        state.sets.set_b.len()
    )?;
    if layout_changed {
        writeln!(
            output,
            "Bin layout changed since this checkpoint was saved; it cannot be resumed. \
             Answer 'n' to start fresh."
        )?;
    }
    writeln!(output, "{}", rule)
}

/// Shows the checkpoint and blocks until a `y` or `n` line is read
///
/// Anything else re-prompts. End of input is an error rather than an endless
/// re-prompt.
pub fn confirm_resume<R, W>(
    state: &CrawlState,
    layout_changed: bool,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    write_checkpoint_summary(state, layout_changed, output)?;

    let mut line = String::new();
    loop {
        write!(output, "{} (y/n): ", RESUME_QUESTION)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no answer to resume prompt",
            ));
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => {
                writeln!(output, "Starting fresh. Previous checkpoint will be discarded.")?;
                return Ok(false);
            }
            _ => writeln!(output, "Please enter 'y' or 'n'.")?,
        }
    }
}
