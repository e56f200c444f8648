//! Paginated fetcher for a single size bin
//!
//! This module pages through one compound query (signature AND size bin),
//! merging every item into the destination set, and handles:
//! - Fixed-cooldown retries of the same page on rate limiting
//! - Bounded exponential backoff on network failures
//! - Early abort on any other query error, keeping what was merged
//! - A density warning when the bin hits the API's enumeration cap
//! - A fixed pause after every served page

use crate::config::{SearchConfig, ThrottleConfig};
use crate::search::{SearchBackend, SearchOutcome};
use std::collections::BTreeSet;
use std::time::Duration;

/// How pagination of a bin ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinStatus {
    /// A short or empty page marked the end of results
    Complete,

    /// Every page the API will serve was read; anything further is unreachable
    CapReached,

    /// A non-retryable error stopped pagination; earlier pages were kept
    Aborted {
        /// HTTP status code
        status: u16,
        /// Error body
        message: String,
    },

    /// The network kept failing past the retry ceiling; earlier pages were kept
    NetworkAbandoned {
        /// Last error seen
        error: String,
    },
}

impl BinStatus {
    /// Returns true if the bin's results may be incomplete
    pub fn is_partial(&self) -> bool {
        !matches!(self, Self::Complete)
    }
}

/// What fetching one bin did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinReport {
    /// Pages successfully served
    pub pages: u32,

    /// Items seen across all pages (including duplicates)
    pub items_seen: usize,

    /// Items that were new to the destination set
    pub items_added: usize,

    /// First page reported a total at or above the enumeration cap
    pub dense: bool,

    /// Rate-limit cooldowns taken
    pub rate_limit_waits: u32,

    /// Network failures retried
    pub network_retries: u32,

    /// How pagination ended
    pub status: BinStatus,
}

impl BinReport {
    fn new() -> Self {
        Self {
            pages: 0,
            items_seen: 0,
            items_added: 0,
            dense: false,
            rate_limit_waits: 0,
            network_retries: 0,
            status: BinStatus::Complete,
        }
    }
}

/// Pages through search results for one query at a time
///
/// Pages are fetched strictly in order; rate limiting and network retries
/// never advance the page counter, so no page is skipped.
#[derive(Debug, Clone)]
pub struct PaginatedFetcher {
    per_page: u32,
    result_cap: u64,
    page_delay: Duration,
    rate_limit_cooldown: Duration,
    network_retry_delay: Duration,
    network_retry_max_delay: Duration,
    network_max_retries: u32,
}

impl PaginatedFetcher {
    /// Creates a fetcher from the search and throttle settings
    pub fn new(search: &SearchConfig, throttle: &ThrottleConfig) -> Self {
        Self {
            per_page: search.per_page.max(1),
            result_cap: search.result_cap,
            page_delay: throttle.page_delay(),
            rate_limit_cooldown: throttle.rate_limit_cooldown(),
            network_retry_delay: throttle.network_retry_delay(),
            network_retry_max_delay: throttle.network_retry_max_delay(),
            network_max_retries: throttle.network_max_retries,
        }
    }

    /// Last page number the API will serve for one query
    fn max_pages(&self) -> u32 {
        let pages = self.result_cap.div_ceil(u64::from(self.per_page));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Backoff before the `attempt`-th retry (1-based): base * 2^(attempt-1), capped
    pub fn network_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.network_retry_delay
            .saturating_mul(factor)
            .min(self.network_retry_max_delay)
    }

    /// Fetches every page of `query`, merging item identifiers into `dest`
    ///
    /// # Arguments
    ///
    /// * `backend` - The search service
    /// * `query` - The full query, signature and size qualifier included
    /// * `dest` - The set being collected; only ever grows
    ///
    /// # Returns
    ///
    /// A report of pages read, items merged and how pagination ended. The
    /// caller treats the bin as completed whatever the status.
    pub async fn fetch_bin<S>(
        &self,
        backend: &S,
        query: &str,
        dest: &mut BTreeSet<String>,
    ) -> BinReport
    where
        S: SearchBackend + ?Sized,
    {
        let mut report = BinReport::new();
        let mut page: u32 = 1;
        let mut consecutive_failures: u32 = 0;

        loop {
            match backend.search(query, page, self.per_page).await {
                SearchOutcome::RateLimited => {
                    report.rate_limit_waits += 1;
                    tracing::warn!(
                        "Rate limit hit on page {} (wait #{}), sleeping {:?}",
                        page,
                        report.rate_limit_waits,
                        self.rate_limit_cooldown
                    );
                    tokio::time::sleep(self.rate_limit_cooldown).await;
                }

                SearchOutcome::NetworkError { error } => {
                    consecutive_failures += 1;
                    if consecutive_failures > self.network_max_retries {
                        tracing::error!(
                            "Giving up on '{}' after {} network failures on page {}: {}",
                            query,
                            consecutive_failures,
                            page,
                            error
                        );
                        report.status = BinStatus::NetworkAbandoned { error };
                        break;
                    }

                    report.network_retries += 1;
                    let delay = self.network_backoff(consecutive_failures);
                    tracing::warn!(
                        "Network error on page {}: {}. Retrying in {:?} ({}/{})",
                        page,
                        error,
                        delay,
                        consecutive_failures,
                        self.network_max_retries
                    );
                    tokio::time::sleep(delay).await;
                }

                SearchOutcome::QueryError { status, message } => {
                    tracing::warn!("Error {} on page {}: {}", status, page, message);
                    report.status = BinStatus::Aborted { status, message };
                    break;
                }

                SearchOutcome::Page(result) => {
                    consecutive_failures = 0;

                    if page == 1 && result.total_count >= self.result_cap {
                        report.dense = true;
                        tracing::warn!(
                            "'{}' reported {} results (cap {}); \
                             density is critically high, results will be incomplete",
                            query,
                            result.total_count,
                            self.result_cap
                        );
                    }

                    let count = result.items.len();
                    report.pages += 1;
                    report.items_seen += count;
                    for item in result.items {
                        if dest.insert(item) {
                            report.items_added += 1;
                        }
                    }

                    tracing::debug!(
                        "Page {}: {} items ({} new so far)",
                        page,
                        count,
                        report.items_added
                    );

                    tokio::time::sleep(self.page_delay).await;

                    if count < self.per_page as usize {
                        break;
                    }

                    if page >= self.max_pages() {
                        report.status = BinStatus::CapReached;
                        break;
                    }

                    page += 1;
                }
            }
        }

        report
    }
}
