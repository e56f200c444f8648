/// Crawl progress definitions persisted between runs
///
/// This module defines the phase marker, the pair of result sets, and the
/// checkpoint record written after every completed bin.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One of the two independent crawl passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Collecting items matching the first signature
    #[serde(rename = "A")]
    A,

    /// Collecting items matching the second signature
    #[serde(rename = "B")]
    B,
}

impl Phase {
    /// Single-letter label used in logs and the checkpoint file
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two result sets, keyed by qualified identifier ("owner/repo")
///
/// Ordered sets keep checkpoint and output files stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSets {
    pub set_a: BTreeSet<String>,
    pub set_b: BTreeSet<String>,
}

impl CrawlSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set owned by `phase`
    pub fn get(&self, phase: Phase) -> &BTreeSet<String> {
        match phase {
            Phase::A => &self.set_a,
            Phase::B => &self.set_b,
        }
    }

    /// Mutable access to the set `phase` is collecting into
    pub fn get_mut(&mut self, phase: Phase) -> &mut BTreeSet<String> {
        match phase {
            Phase::A => &mut self.set_a,
            Phase::B => &mut self.set_b,
        }
    }
}

/// Durable snapshot of crawl progress
///
/// `last_bin_idx` is only ever advanced after every page of that bin has been
/// merged, so resuming always restarts the next bin from page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    /// Phase that was running when this snapshot was taken
    pub phase: Phase,

    /// Index of the last bin whose pages were fully merged
    pub last_bin_idx: usize,

    /// Both result sets, regardless of which phase is active
    #[serde(flatten)]
    pub sets: CrawlSets,

    /// Fingerprint of the bin layout the index refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins_fingerprint: Option<String>,

    /// When this snapshot was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl CrawlState {
    /// Creates a snapshot marking `last_bin_idx` of `phase` as completed
    pub fn new(phase: Phase, last_bin_idx: usize, sets: CrawlSets) -> Self {
        Self {
            phase,
            last_bin_idx,
            sets,
            bins_fingerprint: None,
            saved_at: None,
        }
    }

    /// Attaches the bin layout fingerprint
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.bins_fingerprint = Some(fingerprint.into());
        self
    }

    /// Records that bin `idx` of the current phase has been fully merged
    pub fn mark_completed(&mut self, idx: usize) {
        self.last_bin_idx = idx;
        self.saved_at = Some(Utc::now());
    }

    /// Returns true if this checkpoint may be resumed against `fingerprint`
    ///
    /// Checkpoints written without a fingerprint are accepted as-is.
    pub fn matches_layout(&self, fingerprint: &str) -> bool {
        self.bins_fingerprint
            .as_deref()
            .map_or(true, |saved| saved == fingerprint)
    }
}
