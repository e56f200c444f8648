//! Phase runner - drives the fetcher across every bin of one phase
//!
//! The runner has no notion of resuming; it starts where it is told and
//! checkpoints after every bin, whatever that bin's outcome.

use crate::bins::SizeBin;
use crate::checkpoint::{CheckpointStore, CrawlSets, CrawlState, Phase};
use crate::crawler::fetcher::PaginatedFetcher;
use crate::search::SearchBackend;
use crate::CensusError;

/// Builds the compound query for one signature and one bin
pub fn build_query(signature: &str, bin: &SizeBin) -> String {
    format!("\"{}\" size:{}", signature, bin)
}

/// Runs one phase over a fixed bin list
pub struct PhaseRunner<'a, S: ?Sized> {
    backend: &'a S,
    fetcher: &'a PaginatedFetcher,
    store: &'a CheckpointStore,
    bins: &'a [SizeBin],
    fingerprint: &'a str,
}

impl<'a, S> PhaseRunner<'a, S>
where
    S: SearchBackend + ?Sized,
{
    pub fn new(
        backend: &'a S,
        fetcher: &'a PaginatedFetcher,
        store: &'a CheckpointStore,
        bins: &'a [SizeBin],
        fingerprint: &'a str,
    ) -> Self {
        Self {
            backend,
            fetcher,
            store,
            bins,
            fingerprint,
        }
    }

    /// Collects `signature` into `phase`'s set for bins `start..`
    ///
    /// Takes ownership of both sets and hands them back when the phase ends.
    /// After each bin the combined state (both sets) is checkpointed with that
    /// bin's index, so the inactive phase's results are never lost.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSets)` - Every bin from `start` was processed
    /// * `Err(CensusError)` - A checkpoint could not be written
    pub async fn run(
        &self,
        phase: Phase,
        signature: &str,
        start: usize,
        sets: CrawlSets,
    ) -> Result<CrawlSets, CensusError> {
        let total = self.bins.len();
        let mut state = CrawlState::new(phase, start.saturating_sub(1), sets)
            .with_fingerprint(self.fingerprint);

        if start >= total {
            tracing::info!("Phase {} already complete, skipping", phase);
            return Ok(state.sets);
        }

        tracing::info!(
            "Phase {} ({}): bins {}..{} of {}",
            phase,
            signature,
            start + 1,
            total,
            total
        );

        for (idx, bin) in self.bins.iter().enumerate().skip(start) {
            let query = build_query(signature, bin);
            tracing::info!("[{}/{}] Phase {} - Fetching: {}", idx + 1, total, phase, query);

            let report = self
                .fetcher
                .fetch_bin(self.backend, &query, state.sets.get_mut(phase))
                .await;

            if report.status.is_partial() {
                tracing::warn!(
                    "Bin {} finished early ({:?}); keeping {} items from {} pages",
                    bin,
                    report.status,
                    report.items_added,
                    report.pages
                );
            } else {
                tracing::debug!(
                    "Bin {}: {} pages, {} new items",
                    bin,
                    report.pages,
                    report.items_added
                );
            }

            // No await between here and the rename, so cancellation can only
            // land on a bin boundary
            state.mark_completed(idx);
            self.store.save(&state)?;
        }

        tracing::info!(
            "Phase {} complete: {} items collected",
            phase,
            state.sets.get(phase).len()
        );

        Ok(state.sets)
    }
}
