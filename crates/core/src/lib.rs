pub mod config;
pub mod identity;
pub mod job_source;
pub mod media;
pub mod metrics;
pub mod orchestrator;
pub mod store;
pub mod testing;
pub mod torrent;
pub mod trackers;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use orchestrator::{OrchestratorConfig, OrchestratorError, ReuploadOrchestrator};
pub use store::{DocumentStore, SqliteDocumentStore};
pub use torrent::{TorrentRecord, TorrentStatus};
