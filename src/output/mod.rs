//! Output module for the final set comparison
//!
//! This module handles:
//! - Splitting set A into items exclusive to A and items shared with B
//! - Writing the exclusive list as a newline-delimited file
//! - Printing run summaries and checkpoint status

pub mod stats;

pub use stats::{print_checkpoint_status, print_summary, CrawlReport};

use crate::checkpoint::{write_atomically, CrawlSets};
use crate::CensusError;
use std::collections::BTreeSet;
use std::path::Path;

/// Set A split against set B
///
/// `pure_a` and `hybrid` partition set A: disjoint, and their union is A.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetComparison {
    /// In A but not in B
    pub pure_a: BTreeSet<String>,

    /// In both A and B
    pub hybrid: BTreeSet<String>,
}

impl SetComparison {
    pub fn compute(sets: &CrawlSets) -> Self {
        let (hybrid, pure_a) = sets
            .set_a
            .iter()
            .cloned()
            .partition(|item| sets.set_b.contains(item));

        Self { pure_a, hybrid }
    }
}

/// Writes `items` to `path`, one per line, replacing the file atomically
///
/// # Returns
///
/// * `Ok(())` - File written
/// * `Err(CensusError::Output)` - The file could not be written
pub fn write_result_list(path: &Path, items: &BTreeSet<String>) -> Result<(), CensusError> {
    let mut body = String::new();
    for item in items {
        body.push_str(item);
        body.push('\n');
    }

    write_atomically(path, body.as_bytes()).map_err(|source| CensusError::Output {
        path: path.to_path_buf(),
        source,
    })
}
