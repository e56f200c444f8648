//! Search API boundary
//!
//! The crawler only needs one operation from the upstream service: run a query
//! for a given page and report either the page's items or why it could not.
//! `SearchBackend` is that seam; `GithubSearch` is the HTTP implementation.

mod github;
#[cfg(test)]
pub(crate) mod scripted;

pub use github::{build_http_client, GithubSearch};

use async_trait::async_trait;

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    /// Total hits reported by the API (may itself be capped)
    pub total_count: u64,

    /// Qualified identifiers of the items on this page
    pub items: Vec<String>,
}

/// Result of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The page was served
    Page(SearchPage),

    /// The API signalled that the request quota is exhausted
    RateLimited,

    /// Any other non-success response
    QueryError {
        /// HTTP status code
        status: u16,
        /// Response body or decoding error
        message: String,
    },

    /// The request never produced a response (connection, timeout, body read)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl SearchOutcome {
    /// Convenience constructor for a served page
    pub fn page(total_count: u64, items: Vec<String>) -> Self {
        Self::Page(SearchPage { total_count, items })
    }
}

/// A paginated search service
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Requests page `page` (1-based) of `query` with `per_page` items per page
    async fn search(&self, query: &str, page: u32, per_page: u32) -> SearchOutcome;
}

#[async_trait]
impl<T: SearchBackend + ?Sized> SearchBackend for &T {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> SearchOutcome {
        (**self).search(query, page, per_page).await
    }
}
