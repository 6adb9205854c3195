use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from job source operations.
#[derive(Debug, Error)]
pub enum JobSourceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A job as reported by the job source. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateJob {
    pub hash: String,
    pub name: String,
    /// Total size in bytes.
    pub size: u64,
    /// Bytes downloaded so far.
    pub completed: u64,
    pub content_path: String,
    pub save_path: String,
    /// Current label (qBittorrent category).
    pub category: String,
}

impl CandidateJob {
    /// Only fully downloaded jobs are eligible.
    pub fn is_complete(&self) -> bool {
        self.completed == self.size
    }
}
