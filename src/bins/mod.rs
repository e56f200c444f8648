//! Size-bin partitioning of the search domain
//!
//! The search API refuses to enumerate more than a fixed number of results per
//! query, so every signature query is split into many narrow `size:` filters.
//! Bins are fine where files are small (and dense) and widen as density drops,
//! ending in one open-ended bin for everything larger.
//!
//! The bin list is consumed by index and the index is what a checkpoint stores,
//! so generation must be a pure function of the segment configuration.

use crate::config::BinSegment;
use sha2::{Digest, Sha256};
use std::fmt;

/// One slice of the size domain, rendered as a search `size:` qualifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeBin {
    /// Inclusive range `lo..hi`
    Range { lo: u64, hi: u64 },

    /// Everything strictly greater than the threshold
    Above(u64),
}

impl SizeBin {
    /// Returns true if `size` falls inside this bin
    pub fn contains(&self, size: u64) -> bool {
        match *self {
            Self::Range { lo, hi } => lo <= size && size <= hi,
            Self::Above(threshold) => size > threshold,
        }
    }

    /// Lowest size covered by this bin
    pub fn lower_bound(&self) -> u64 {
        match *self {
            Self::Range { lo, .. } => lo,
            Self::Above(threshold) => threshold + 1,
        }
    }
}

impl fmt::Display for SizeBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { lo, hi } => write!(f, "{}..{}", lo, hi),
            Self::Above(threshold) => write!(f, ">{}", threshold),
        }
    }
}

/// Generates the ordered, exhaustive bin list for the given segments
///
/// Each segment `start..end` is cut into `step`-wide inclusive ranges, the last
/// one clamped to `end - 1`. A final `Above` bin picks up everything past the
/// last range. Segments are expected to be validated (contiguous from zero,
/// non-zero steps); an empty slice yields one catch-all range.
///
/// # Example
///
/// ```
/// use sig_census::bins::generate_bins;
/// use sig_census::config::BinSegment;
///
/// let bins = generate_bins(&[BinSegment::new(0, 10, 5)]);
/// let rendered: Vec<String> = bins.iter().map(|b| b.to_string()).collect();
/// assert_eq!(rendered, vec!["0..4", "5..9", ">9"]);
/// ```
pub fn generate_bins(segments: &[BinSegment]) -> Vec<SizeBin> {
    let mut bins = Vec::new();
    let mut last_hi = None;

    for segment in segments {
        if segment.step == 0 {
            continue;
        }

        let mut lo = segment.start;
        while lo < segment.end {
            let hi = lo.saturating_add(segment.step - 1).min(segment.end - 1);
            bins.push(SizeBin::Range { lo, hi });
            last_hi = Some(hi);
            lo = hi + 1;
        }
    }

    match last_hi {
        Some(hi) => bins.push(SizeBin::Above(hi)),
        // Nothing configured: a single bin for every size
        None => bins.push(SizeBin::Range { lo: 0, hi: u64::MAX }),
    }

    bins
}

/// Hex SHA-256 over the rendered bin list
///
/// Stored in checkpoints so a resume against a different bin layout is caught
/// instead of silently skipping or repeating bins.
pub fn bins_fingerprint(bins: &[SizeBin]) -> String {
    let mut hasher = Sha256::new();
    for bin in bins {
        hasher.update(bin.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
