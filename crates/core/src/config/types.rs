use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::identity::{TmdbConfig, TvMazeConfig};
use crate::orchestrator::OrchestratorConfig;
use crate::torrent::TorrentStatus;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub job_source: JobSourceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub trackers: Vec<TrackerConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reuploader.db")
}

/// Job source configuration. Only qBittorrent is supported.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobSourceConfig {
    pub qbittorrent: QBittorrentConfig,
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Labels written to and read from the job source.
///
/// A job is watched when its label starts with `prefix`. Dynamic tracker
/// hints are encoded after the prefix, joined by `delimiter`
/// (e.g. `GGBOT::TSP::ATH`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LabelConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_uploaded_label")]
    pub uploaded: String,
    #[serde(default = "default_partial_label")]
    pub partial: String,
    #[serde(default = "default_failed_label")]
    pub failed: String,
    #[serde(default = "default_dupe_label")]
    pub dupe: String,
    #[serde(default = "default_unidentified_label")]
    pub unidentified: String,
    #[serde(default = "default_error_label")]
    pub error: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            delimiter: default_delimiter(),
            uploaded: default_uploaded_label(),
            partial: default_partial_label(),
            failed: default_failed_label(),
            dupe: default_dupe_label(),
            unidentified: default_unidentified_label(),
            error: default_error_label(),
        }
    }
}

impl LabelConfig {
    /// Label to write back for a given status.
    /// Non-terminal intake states keep whatever label the job already has.
    pub fn label_for(&self, status: &TorrentStatus) -> Option<&str> {
        match status {
            TorrentStatus::Pending | TorrentStatus::ReadyForProcessing => None,
            TorrentStatus::Success => Some(&self.uploaded),
            TorrentStatus::PartiallySuccessful => Some(&self.partial),
            TorrentStatus::Failed => Some(&self.failed),
            TorrentStatus::DupeCheckFailed => Some(&self.dupe),
            TorrentStatus::TmdbIdentificationFailed => Some(&self.unidentified),
            TorrentStatus::UnknownFailure | TorrentStatus::Other(_) => Some(&self.error),
        }
    }
}

fn default_prefix() -> String {
    "GGBOT".to_string()
}

fn default_delimiter() -> String {
    "::".to_string()
}

fn default_uploaded_label() -> String {
    "GGBOT_UPLOADED".to_string()
}

fn default_partial_label() -> String {
    "GGBOT_PARTIAL".to_string()
}

fn default_failed_label() -> String {
    "GGBOT_FAILED".to_string()
}

fn default_dupe_label() -> String {
    "GGBOT_DUPE".to_string()
}

fn default_unidentified_label() -> String {
    "GGBOT_UNIDENTIFIED".to_string()
}

fn default_error_label() -> String {
    "GGBOT_ERROR".to_string()
}

/// Identity resolution backends and operator overrides
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default)]
    pub tvmaze: Option<TvMazeConfig>,
    /// Operator-supplied IDs for specific jobs, keyed by hash.
    #[serde(default)]
    pub overrides: Vec<IdentityOverride>,
}

/// Operator-supplied identity for one job. Takes priority over the cache.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdentityOverride {
    pub hash: String,
    #[serde(default)]
    pub imdb: Option<String>,
    #[serde(default)]
    pub tmdb: Option<String>,
    #[serde(default)]
    pub tvmaze: Option<String>,
    #[serde(default)]
    pub tvdb: Option<String>,
}

/// One destination tracker
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Short tracker code (e.g. "TSP").
    pub code: String,
    /// Endpoint the upload payload is POSTed to.
    pub upload_url: String,
    pub auth: TrackerAuthConfig,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Authentication mode for a tracker
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrackerAuthConfig {
    /// Key passed as a query parameter.
    ApiKey {
        #[serde(default = "default_api_key_param")]
        param: String,
        key: String,
    },
    /// Arbitrary header carrying the secret.
    Header { name: String, value: String },
    /// `Authorization: Bearer <token>`.
    Bearer { token: String },
    /// Raw `Cookie` header.
    Cookie { cookie: String },
}

fn default_api_key_param() -> String {
    "api_token".to_string()
}

impl TrackerAuthConfig {
    fn mode(&self) -> &'static str {
        match self {
            TrackerAuthConfig::ApiKey { .. } => "api_key",
            TrackerAuthConfig::Header { .. } => "header",
            TrackerAuthConfig::Bearer { .. } => "bearer",
            TrackerAuthConfig::Cookie { .. } => "cookie",
        }
    }

    /// The secret part of the credential.
    pub fn secret(&self) -> &str {
        match self {
            TrackerAuthConfig::ApiKey { key, .. } => key,
            TrackerAuthConfig::Header { value, .. } => value,
            TrackerAuthConfig::Bearer { token } => token,
            TrackerAuthConfig::Cookie { cookie } => cookie,
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub orchestrator: OrchestratorConfig,
    pub labels: LabelConfig,
    pub job_source: SanitizedJobSourceConfig,
    pub identity: SanitizedIdentityConfig,
    pub trackers: Vec<SanitizedTrackerConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedJobSourceConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIdentityConfig {
    pub tmdb_configured: bool,
    pub tvmaze_configured: bool,
    pub override_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTrackerConfig {
    pub code: String,
    pub upload_url: String,
    pub auth_mode: String,
    pub credentials_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let qbit = &config.job_source.qbittorrent;
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            orchestrator: config.orchestrator.clone(),
            labels: config.labels.clone(),
            job_source: SanitizedJobSourceConfig {
                url: qbit.url.clone(),
                username: qbit.username.clone(),
                password_configured: !qbit.password.is_empty(),
                timeout_secs: qbit.timeout_secs,
            },
            identity: SanitizedIdentityConfig {
                tmdb_configured: config
                    .identity
                    .tmdb
                    .as_ref()
                    .is_some_and(|t| !t.api_key.is_empty()),
                tvmaze_configured: config.identity.tvmaze.is_some(),
                override_count: config.identity.overrides.len(),
            },
            trackers: config
                .trackers
                .iter()
                .map(|t| SanitizedTrackerConfig {
                    code: t.code.clone(),
                    upload_url: t.upload_url.clone(),
                    auth_mode: t.auth.mode().to_string(),
                    credentials_configured: !t.auth.secret().is_empty(),
                })
                .collect(),
        }
    }
}
