//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the re-upload orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Enable/disable the polling loop.
    /// When disabled, cycles can still be triggered via the API.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Attempts allowed per job before it is marked UNKNOWN_FAILURE.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Let the identity resolver pick among several search candidates.
    #[serde(default)]
    pub auto_mode: bool,

    /// Read target trackers from job labels.
    #[serde(default = "default_true")]
    pub dynamic_tracker_selection_enabled: bool,

    /// Largest candidate count auto mode may pick from (0 = unlimited).
    #[serde(default)]
    pub tmdb_auto_select_threshold: usize,

    /// Trackers used when the label names none.
    #[serde(default)]
    pub static_trackers: Vec<String>,
}

fn default_poll_interval() -> u64 {
    60
}

fn default_retry_limit() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: default_poll_interval(),
            retry_limit: default_retry_limit(),
            auto_mode: false,
            dynamic_tracker_selection_enabled: true,
            tmdb_auto_select_threshold: 0,
            static_trackers: Vec::new(),
        }
    }
}
