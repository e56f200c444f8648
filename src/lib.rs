//! Sig-Census: a resumable signature census over a paginated code search API
//!
//! This crate enumerates every repository matching two textual signatures
//! ("Set A" and "Set B"), splitting each query into size bins to stay under the
//! search API's result cap, checkpointing after every bin so an interrupted
//! multi-hour run can resume, and finally computing the set difference and
//! intersection of the two result sets.

pub mod bins;
pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod output;
pub mod search;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Sig-Census operations
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to write output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Checkpoint was written with a different bin layout (saved {saved}, current {current}); \
         start fresh to discard it"
    )]
    BinsChanged { saved: String, current: String },

    #[error("Resume prompt failed: {0}")]
    Prompt(std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Checkpoint persistence errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize checkpoint: {0}")]
    Serialize(serde_json::Error),

    #[error("Failed to parse checkpoint {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result type alias for Sig-Census operations
pub type Result<T> = std::result::Result<T, CensusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use bins::{generate_bins, SizeBin};
pub use checkpoint::{CheckpointStore, CrawlSets, CrawlState, Phase};
pub use config::Config;
pub use crawler::{CrawlOutcome, Orchestrator, ResumePolicy};
pub use search::{GithubSearch, SearchBackend, SearchOutcome};
