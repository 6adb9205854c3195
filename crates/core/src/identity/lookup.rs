use async_trait::async_trait;
use thiserror::Error;

use super::types::{ContentType, IdSystem, MediaCandidate};

/// Errors from external ID lookups.
///
/// The resolver treats every variant as "no data"; they only surface in logs.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Client not configured: {0}")]
    NotConfigured(String),

    #[error("Unsupported lookup: {from} -> {to}")]
    Unsupported { from: IdSystem, to: IdSystem },
}

/// External ID lookup backend.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Translate `id` in system `from` to system `to`.
    /// `Ok(None)` means the backend knows nothing about it.
    async fn fetch_id(
        &self,
        from: IdSystem,
        id: &str,
        to: IdSystem,
        content_type: ContentType,
    ) -> Result<Option<String>, LookupError>;

    /// Title search against the TMDB catalogue.
    async fn search(
        &self,
        title: &str,
        year: Option<u32>,
        content_type: ContentType,
    ) -> Result<Vec<MediaCandidate>, LookupError>;
}

/// A single lookup: one external call translating `from` into `to`.
pub type Edge = (IdSystem, IdSystem);

/// Edges explored during the propagation rounds.
pub fn propagation_edges(content_type: ContentType) -> Vec<Edge> {
    use IdSystem::*;

    let mut edges = vec![(Imdb, Tmdb), (Imdb, Tvdb), (Tmdb, Imdb), (Tmdb, Tvdb)];
    if content_type == ContentType::Episode {
        edges.push((Tvmaze, Imdb));
        edges.push((Tvmaze, Tvdb));
    }
    edges.push((Tvdb, Tmdb));
    if content_type == ContentType::Episode {
        edges.push((Tvdb, Tvmaze));
    }
    edges
}

/// Single-hop fallbacks for IDs still missing after propagation.
pub fn direct_edges(content_type: ContentType) -> Vec<Edge> {
    use IdSystem::*;

    let mut edges = vec![(Imdb, Tmdb), (Tvdb, Tmdb)];
    if content_type == ContentType::Episode {
        edges.push((Imdb, Tvmaze));
        edges.push((Tvdb, Tvmaze));
    }
    edges
}
