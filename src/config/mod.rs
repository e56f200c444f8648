//! Configuration module for Sig-Census
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so an empty file (or no file) reproduces the
//! stock cudaMalloc / hip_runtime.h census.
//!
//! # Example
//!
//! ```no_run
//! use sig_census::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("census.toml")).unwrap();
//! println!("Phase A signature: {}", config.signatures.set_a);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_bin_segments, BinSegment, Config, OutputConfig, SearchConfig, SignatureConfig,
    ThrottleConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
