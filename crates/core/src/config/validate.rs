use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Poll interval and retry limit are not 0
/// - qBittorrent URL is set
/// - Tracker codes are unique and every static tracker is configured
/// - Label prefix and delimiter are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.orchestrator.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.poll_interval_secs cannot be 0".to_string(),
        ));
    }

    if config.orchestrator.retry_limit == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.retry_limit must be at least 1".to_string(),
        ));
    }

    if config.job_source.qbittorrent.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "job_source.qbittorrent.url cannot be empty".to_string(),
        ));
    }

    if config.labels.prefix.is_empty() || config.labels.delimiter.is_empty() {
        return Err(ConfigError::ValidationError(
            "labels.prefix and labels.delimiter cannot be empty".to_string(),
        ));
    }

    let mut codes = HashSet::new();
    for tracker in &config.trackers {
        if !codes.insert(tracker.code.to_uppercase()) {
            return Err(ConfigError::ValidationError(format!(
                "tracker {} is configured more than once",
                tracker.code
            )));
        }
    }

    if config.orchestrator.enabled && config.orchestrator.static_trackers.is_empty() {
        return Err(ConfigError::ValidationError(
            "orchestrator.static_trackers cannot be empty when the orchestrator is enabled"
                .to_string(),
        ));
    }

    for code in &config.orchestrator.static_trackers {
        if !codes.contains(&code.to_uppercase()) {
            return Err(ConfigError::ValidationError(format!(
                "static tracker {} has no [[trackers]] entry",
                code
            )));
        }
    }

    Ok(())
}
