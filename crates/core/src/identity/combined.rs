use async_trait::async_trait;

use super::lookup::{IdentityLookup, LookupError};
use super::tmdb::{TmdbClient, TmdbConfig};
use super::tvmaze::{TvMazeClient, TvMazeConfig};
use super::types::{ContentType, IdSystem, MediaCandidate};

/// Lookup that routes each edge to the backend able to answer it.
///
/// TVmaze answers everything involving TVmaze IDs and, for episodes,
/// IMDb to TVDB. TMDB answers the rest and all title searches.
pub struct CombinedLookup {
    tmdb: Option<TmdbClient>,
    tvmaze: Option<TvMazeClient>,
}

impl CombinedLookup {
    /// Create a new combined lookup with optional backends.
    pub fn new(tmdb: Option<TmdbClient>, tvmaze: Option<TvMazeClient>) -> Self {
        Self { tmdb, tvmaze }
    }

    /// Build the configured backends.
    pub fn from_config(
        tmdb: Option<&TmdbConfig>,
        tvmaze: Option<&TvMazeConfig>,
    ) -> Result<Self, LookupError> {
        let tmdb = tmdb.map(|c| TmdbClient::new(c.clone())).transpose()?;
        let tvmaze = tvmaze.map(|c| TvMazeClient::new(c.clone())).transpose()?;
        Ok(Self::new(tmdb, tvmaze))
    }

    /// Check if TMDB is available.
    pub fn has_tmdb(&self) -> bool {
        self.tmdb.is_some()
    }

    /// Check if TVmaze is available.
    pub fn has_tvmaze(&self) -> bool {
        self.tvmaze.is_some()
    }

    fn backend_for(
        &self,
        from: IdSystem,
        to: IdSystem,
        content_type: ContentType,
    ) -> Result<&dyn IdentityLookup, LookupError> {
        let wants_tvmaze = from == IdSystem::Tvmaze
            || to == IdSystem::Tvmaze
            || (content_type == ContentType::Episode
                && from == IdSystem::Imdb
                && to == IdSystem::Tvdb
                && self.tvmaze.is_some());

        if wants_tvmaze {
            return self
                .tvmaze
                .as_ref()
                .map(|c| c as &dyn IdentityLookup)
                .ok_or_else(|| LookupError::NotConfigured("TVmaze is not configured".to_string()));
        }

        self.tmdb
            .as_ref()
            .map(|c| c as &dyn IdentityLookup)
            .ok_or_else(|| LookupError::NotConfigured("TMDB is not configured".to_string()))
    }
}

#[async_trait]
impl IdentityLookup for CombinedLookup {
    async fn fetch_id(
        &self,
        from: IdSystem,
        id: &str,
        to: IdSystem,
        content_type: ContentType,
    ) -> Result<Option<String>, LookupError> {
        self.backend_for(from, to, content_type)?
            .fetch_id(from, id, to, content_type)
            .await
    }

    async fn search(
        &self,
        title: &str,
        year: Option<u32>,
        content_type: ContentType,
    ) -> Result<Vec<MediaCandidate>, LookupError> {
        match &self.tmdb {
            Some(client) => client.search(title, year, content_type).await,
            None => Err(LookupError::NotConfigured(
                "TMDB is not configured".to_string(),
            )),
        }
    }
}
