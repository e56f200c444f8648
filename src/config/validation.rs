use crate::config::types::{
    BinSegment, Config, OutputConfig, SearchConfig, SignatureConfig, ThrottleConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_signatures(&config.signatures)?;
    validate_throttle_config(&config.throttle)?;
    validate_output_config(&config.output)?;
    validate_bin_segments(&config.bins)?;
    Ok(())
}

/// Validates search endpoint configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.api_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "api-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.per_page < 1 || config.per_page > 100 {
        return Err(ConfigError::Validation(format!(
            "per-page must be between 1 and 100, got {}",
            config.per_page
        )));
    }

    if config.result_cap < u64::from(config.per_page) {
        return Err(ConfigError::Validation(format!(
            "result-cap ({}) must be at least per-page ({})",
            config.result_cap, config.per_page
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_signatures(config: &SignatureConfig) -> Result<(), ConfigError> {
    if config.set_a.trim().is_empty() || config.set_b.trim().is_empty() {
        return Err(ConfigError::Validation(
            "both signatures must be non-empty".to_string(),
        ));
    }

    if config.set_a == config.set_b {
        return Err(ConfigError::Validation(format!(
            "set-a and set-b must differ, both are '{}'",
            config.set_a
        )));
    }

    if config.set_a.contains('"') || config.set_b.contains('"') {
        return Err(ConfigError::Validation(
            "signatures are quoted in the query and cannot contain '\"'".to_string(),
        ));
    }

    Ok(())
}

fn validate_throttle_config(config: &ThrottleConfig) -> Result<(), ConfigError> {
    if config.network_retry_max_delay_ms < config.network_retry_delay_ms {
        return Err(ConfigError::Validation(format!(
            "network-retry-max-delay-ms ({}) must be >= network-retry-delay-ms ({})",
            config.network_retry_max_delay_ms, config.network_retry_delay_ms
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.checkpoint_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-path cannot be empty".to_string(),
        ));
    }

    if config.result_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "result-path cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_path == config.result_path {
        return Err(ConfigError::Validation(
            "checkpoint-path and result-path must differ".to_string(),
        ));
    }

    Ok(())
}

/// Validates that the segments tile `[0, last.end)` with no gap or overlap
///
/// The open-ended tail bin then covers everything above, so contiguity here is
/// what makes the generated bins exhaustive.
fn validate_bin_segments(segments: &[BinSegment]) -> Result<(), ConfigError> {
    let Some(first) = segments.first() else {
        return Err(ConfigError::Validation(
            "at least one bin segment is required".to_string(),
        ));
    };

    if first.start != 0 {
        return Err(ConfigError::Validation(format!(
            "first bin segment must start at 0, got {}",
            first.start
        )));
    }

    let mut expected_start = 0;
    for (i, segment) in segments.iter().enumerate() {
        if segment.step == 0 {
            return Err(ConfigError::Validation(format!(
                "bin segment {} has a zero step",
                i
            )));
        }

        if segment.start >= segment.end {
            return Err(ConfigError::Validation(format!(
                "bin segment {} is empty: start {} >= end {}",
                i, segment.start, segment.end
            )));
        }

        if segment.start != expected_start {
            return Err(ConfigError::Validation(format!(
                "bin segment {} starts at {} but the previous one ended at {}",
                i, segment.start, expected_start
            )));
        }

        expected_start = segment.end;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_per_page_bounds() {
        let mut config = Config::default();
        config.search.per_page = 0;
        assert!(validate(&config).is_err());

        config.search.per_page = 101;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_result_cap_below_page_size() {
        let mut config = Config::default();
        config.search.result_cap = 50;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_invalid_api_url() {
        let mut config = Config::default();
        config.search.api_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.search.api_url = "ftp://example.com/search".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_identical_signatures_rejected() {
        let mut config = Config::default();
        config.signatures.set_b = config.signatures.set_a.clone();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_backoff_ceiling_below_base() {
        let mut config = Config::default();
        config.throttle.network_retry_max_delay_ms = 10;
        config.throttle.network_retry_delay_ms = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_segments_must_start_at_zero() {
        let segments = vec![BinSegment::new(10, 100, 10)];
        assert!(validate_bin_segments(&segments).is_err());
    }

    #[test]
    fn test_segments_must_be_contiguous() {
        let gap = vec![BinSegment::new(0, 100, 10), BinSegment::new(150, 200, 10)];
        assert!(validate_bin_segments(&gap).is_err());

        let overlap = vec![BinSegment::new(0, 100, 10), BinSegment::new(50, 200, 10)];
        assert!(validate_bin_segments(&overlap).is_err());
    }

    #[test]
    fn test_segment_zero_step_and_empty() {
        assert!(validate_bin_segments(&[BinSegment::new(0, 100, 0)]).is_err());
        assert!(validate_bin_segments(&[BinSegment::new(0, 0, 5)]).is_err());
        assert!(validate_bin_segments(&[]).is_err());
    }
}
