use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Sig-Census
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub signatures: SignatureConfig,
    pub throttle: ThrottleConfig,
    pub output: OutputConfig,
    pub bins: Vec<BinSegment>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            signatures: SignatureConfig::default(),
            throttle: ThrottleConfig::default(),
            output: OutputConfig::default(),
            bins: default_bin_segments(),
        }
    }
}

/// Search API endpoint and paging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Code search endpoint
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Items requested per page
    #[serde(rename = "per-page")]
    pub per_page: u32,

    /// Hard cap on results the API will enumerate for a single query
    #[serde(rename = "result-cap")]
    pub result_cap: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com/search/code".to_string(),
            per_page: 100,
            result_cap: 1000,
            user_agent: concat!("sig-census/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// The two mutually exclusive signatures being compared
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Signature collected in phase A
    #[serde(rename = "set-a")]
    pub set_a: String,

    /// Signature collected in phase B
    #[serde(rename = "set-b")]
    pub set_b: String,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            set_a: "cudaMalloc".to_string(),
            set_b: "hip_runtime.h".to_string(),
        }
    }
}

/// Pacing and retry behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Pause after every successful page (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Fixed cooldown after a rate-limit response (milliseconds)
    #[serde(rename = "rate-limit-cooldown-ms")]
    pub rate_limit_cooldown_ms: u64,

    /// First backoff delay after a network failure (milliseconds)
    #[serde(rename = "network-retry-delay-ms")]
    pub network_retry_delay_ms: u64,

    /// Upper bound for the exponential network backoff (milliseconds)
    #[serde(rename = "network-retry-max-delay-ms")]
    pub network_retry_max_delay_ms: u64,

    /// Consecutive network failures tolerated before a bin is abandoned
    #[serde(rename = "network-max-retries")]
    pub network_max_retries: u32,
}

impl ThrottleConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }

    pub fn network_retry_delay(&self) -> Duration {
        Duration::from_millis(self.network_retry_delay_ms)
    }

    pub fn network_retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.network_retry_max_delay_ms)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: 6_500,
            rate_limit_cooldown_ms: 65_000,
            network_retry_delay_ms: 30_000,
            network_retry_max_delay_ms: 600_000,
            network_max_retries: 8,
        }
    }
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the JSON checkpoint file
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: PathBuf,

    /// Path to the newline-delimited list of Set A items not in Set B
    #[serde(rename = "result-path")]
    pub result_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: PathBuf::from("cuda_research_checkpoint.json"),
            result_path: PathBuf::from("pure_cuda_repos.txt"),
        }
    }
}

/// One stretch of the size domain split into equal-width bins
///
/// Covers `start..end` (end exclusive) in steps of `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BinSegment {
    pub start: u64,
    pub end: u64,
    pub step: u64,
}

impl BinSegment {
    pub const fn new(start: u64, end: u64, step: u64) -> Self {
        Self { start, end, step }
    }
}

/// Fine bins where repositories are dense, coarse ones in the long tail
pub fn default_bin_segments() -> Vec<BinSegment> {
    vec![
        BinSegment::new(0, 5_000, 5),
        BinSegment::new(5_000, 15_000, 20),
        BinSegment::new(15_000, 50_000, 100),
        BinSegment::new(50_000, 100_000, 500),
        BinSegment::new(100_000, 384_000, 2_000),
    ]
}
