//! GitHub code search client
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with user agent, timeouts and auth header
//! - Issuing paged code search queries
//! - Classifying responses into pages, rate limits, query errors and
//!   network failures

use crate::config::SearchConfig;
use crate::search::{SearchBackend, SearchOutcome, SearchPage};
use crate::CensusError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Code search response body (only the fields the crawler reads)
#[derive(Debug, Deserialize)]
struct CodeSearchBody {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    items: Vec<CodeSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CodeSearchItem {
    repository: RepositoryRef,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    full_name: String,
}

/// Builds an HTTP client for the search API
///
/// # Arguments
///
/// * `config` - The search configuration (user agent, timeout)
/// * `token` - Optional API token sent as `Authorization: token <t>`
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CensusError)` - Invalid token characters or client build failure
pub fn build_http_client(
    config: &SearchConfig,
    token: Option<&str>,
) -> Result<Client, CensusError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github.v3+json"),
    );

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("token {}", token)).map_err(|_| {
            crate::ConfigError::Validation("API token contains invalid characters".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// `SearchBackend` over the GitHub REST code search endpoint
#[derive(Debug, Clone)]
pub struct GithubSearch {
    client: Client,
    endpoint: Url,
}

impl GithubSearch {
    /// Creates a client for the endpoint in `config`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sig_census::config::SearchConfig;
    /// use sig_census::search::GithubSearch;
    ///
    /// let search = GithubSearch::new(&SearchConfig::default(), None).unwrap();
    /// ```
    pub fn new(config: &SearchConfig, token: Option<&str>) -> Result<Self, CensusError> {
        let endpoint = Url::parse(&config.api_url)
            .map_err(|e| crate::ConfigError::InvalidUrl(format!("Invalid api-url: {}", e)))?;
        let client = build_http_client(config, token)?;
        Ok(Self { client, endpoint })
    }

    /// Creates a search backend from an existing client
    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    async fn classify(response: Response) -> SearchOutcome {
        let status = response.status();

        if status.is_success() {
            return match response.text().await {
                Ok(body) => parse_page(status, &body),
                Err(e) => SearchOutcome::NetworkError {
                    error: format!("failed to read response body: {}", e),
                },
            };
        }

        let quota_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");
        let message = response.text().await.unwrap_or_default();

        if is_rate_limited(status, quota_exhausted, &message) {
            SearchOutcome::RateLimited
        } else {
            SearchOutcome::QueryError {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[async_trait]
impl SearchBackend for GithubSearch {
    async fn search(&self, query: &str, page: u32, per_page: u32) -> SearchOutcome {
        let request = self.client.get(self.endpoint.clone()).query(&[
            ("q", query.to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ]);

        match request.send().await {
            Ok(response) => Self::classify(response).await,
            Err(e) => {
                // Classify error
                let error = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    format!("Connection failed: {}", e)
                } else {
                    e.to_string()
                };
                SearchOutcome::NetworkError { error }
            }
        }
    }
}

/// 429 always means "slow down"; GitHub also reports quota exhaustion (primary
/// and secondary limits) as 403
fn is_rate_limited(status: StatusCode, quota_exhausted: bool, message: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }

    status == StatusCode::FORBIDDEN
        && (quota_exhausted || message.to_ascii_lowercase().contains("rate limit"))
}

fn parse_page(status: StatusCode, body: &str) -> SearchOutcome {
    match serde_json::from_str::<CodeSearchBody>(body) {
        Ok(parsed) => SearchOutcome::Page(SearchPage {
            total_count: parsed.total_count,
            items: parsed
                .items
                .into_iter()
                .map(|item| item.repository.full_name)
                .collect(),
        }),
        Err(e) => SearchOutcome::QueryError {
            status: status.as_u16(),
            message: format!("malformed search response: {}", e),
        },
    }
}
