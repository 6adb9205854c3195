use std::sync::Arc;
use reuploader_core::{Config, ReuploadOrchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<ReuploadOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<ReuploadOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &ReuploadOrchestrator {
        self.orchestrator.as_ref()
    }
}
