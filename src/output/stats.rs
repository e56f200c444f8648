//! Run summaries for the terminal
//!
//! This module provides the final census counts and the checkpoint status
//! view used by `--status`.

use crate::checkpoint::{CrawlSets, CrawlState};
use crate::config::SignatureConfig;
use crate::output::SetComparison;

/// Final census counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlReport {
    /// Items matching signature A
    pub set_a: usize,

    /// Items matching signature B
    pub set_b: usize,

    /// Items matching both
    pub hybrid: usize,

    /// Items matching A only
    pub pure_a: usize,
}

impl CrawlReport {
    pub fn new(sets: &CrawlSets, comparison: &SetComparison) -> Self {
        Self {
            set_a: sets.set_a.len(),
            set_b: sets.set_b.len(),
            hybrid: comparison.hybrid.len(),
            pure_a: comparison.pure_a.len(),
        }
    }
}

/// Prints the final counts to stdout
///
/// # Arguments
///
/// * `report` - The counts to display
/// * `signatures` - Signature labels for the two sets
pub fn print_summary(report: &CrawlReport, signatures: &SignatureConfig) {
    println!("\n=== Census Results ===\n");
    for line in summary_lines(report, signatures) {
        println!("{}", line);
    }
}

fn summary_lines(report: &CrawlReport, signatures: &SignatureConfig) -> [String; 4] {
    [
        format!("Total Repositories using {}: {}", signatures.set_a, report.set_a),
        format!("Total Repositories including {}: {}", signatures.set_b, report.set_b),
        format!("Hybrid Repositories (Support both): {}", report.hybrid),
        format!(
            "PURE {} REPOSITORIES (Lock-in): {}",
            signatures.set_a.to_uppercase(),
            report.pure_a
        ),
    ]
}

/// Prints what a checkpoint holds and whether it can be resumed
///
/// # Arguments
///
/// * `state` - The loaded checkpoint
/// * `bin_count` - Number of bins in the current layout
/// * `fingerprint` - Fingerprint of the current layout
pub fn print_checkpoint_status(state: &CrawlState, bin_count: usize, fingerprint: &str) {
    println!("=== Checkpoint Status ===\n");
    println!("Phase: {}", state.phase);
    let done = completed_bins(state);
    println!(
        "Last completed bin: {} of {} ({:.1}%)",
        done,
        bin_count,
        progress_percent(done, bin_count)
    );
    println!("Set A: {} repos", state.sets.set_a.len());
    println!("Set B: {} repos", state.sets.set_b.len());

    match state.saved_at {
        Some(saved_at) => println!("Saved at: {}", saved_at.to_rfc3339()),
        None => println!("Saved at: unknown"),
    }

    if state.matches_layout(fingerprint) {
        println!("\n✓ Bin layout matches; this checkpoint can be resumed");
    } else {
        println!("\n✗ Bin layout changed since this checkpoint; run with --fresh");
    }
}

fn completed_bins(state: &CrawlState) -> usize {
    state.last_bin_idx.saturating_add(1)
}

fn progress_percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (done as f64 / total as f64) * 100.0
    }
}
