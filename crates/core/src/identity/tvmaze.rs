//! TVmaze API client.
//!
//! TVmaze is free and needs no key. It only knows about TV shows,
//! so every lookup here is episode-only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lookup::{IdentityLookup, LookupError};
use super::types::{ContentType, IdSystem, MediaCandidate};

/// TVmaze client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvMazeConfig {
    /// Base URL (default: https://api.tvmaze.com).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,
}

impl Default for TvMazeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u32 {
    30
}

/// TVmaze API client.
pub struct TvMazeClient {
    client: Client,
    base_url: String,
}

impl TvMazeClient {
    pub fn new(config: TvMazeConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.tvmaze.com".to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look a show up by IMDb or TVDB ID.
    pub async fn lookup_show(
        &self,
        source: IdSystem,
        id: &str,
    ) -> Result<Option<TvMazeShow>, LookupError> {
        let param = match source {
            IdSystem::Imdb => "imdb",
            IdSystem::Tvdb => "thetvdb",
            other => {
                return Err(LookupError::Unsupported {
                    from: other,
                    to: IdSystem::Tvmaze,
                })
            }
        };

        debug!("TVmaze lookup: {}={}", param, id);

        let url = format!("{}/lookup/shows", self.base_url);
        let response = self.client.get(&url).query(&[(param, id)]).send().await?;
        self.parse_show(response).await
    }

    /// Fetch a show by TVmaze ID.
    pub async fn get_show(&self, tvmaze_id: &str) -> Result<Option<TvMazeShow>, LookupError> {
        debug!("TVmaze get show: id={}", tvmaze_id);

        let url = format!(
            "{}/shows/{}",
            self.base_url,
            urlencoding::encode(tvmaze_id)
        );
        let response = self.client.get(&url).send().await?;
        self.parse_show(response).await
    }

    async fn parse_show(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<TvMazeShow>, LookupError> {
        let status = response.status();
        if status == 404 {
            return Ok(None);
        }
        if status == 429 {
            return Err(LookupError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let show: TvMazeShow = response.json().await.map_err(|e| {
            LookupError::ParseError(format!("Failed to parse TVmaze show: {}", e))
        })?;

        Ok(Some(show))
    }
}

#[async_trait]
impl IdentityLookup for TvMazeClient {
    async fn fetch_id(
        &self,
        from: IdSystem,
        id: &str,
        to: IdSystem,
        content_type: ContentType,
    ) -> Result<Option<String>, LookupError> {
        if content_type != ContentType::Episode {
            return Ok(None);
        }

        let show = match (from, to) {
            (IdSystem::Tvmaze, IdSystem::Imdb | IdSystem::Tvdb) => self.get_show(id).await?,
            (IdSystem::Imdb | IdSystem::Tvdb, IdSystem::Tvmaze | IdSystem::Imdb | IdSystem::Tvdb)
                if from != to =>
            {
                self.lookup_show(from, id).await?
            }
            _ => return Err(LookupError::Unsupported { from, to }),
        };

        Ok(show.and_then(|s| s.id_for(to)))
    }

    async fn search(
        &self,
        _title: &str,
        _year: Option<u32>,
        _content_type: ContentType,
    ) -> Result<Vec<MediaCandidate>, LookupError> {
        Err(LookupError::NotConfigured(
            "TVmaze does not provide TMDB search".to_string(),
        ))
    }
}

/// Show payload (only the fields used for ID translation).
#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeShow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub externals: TvMazeExternals,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TvMazeExternals {
    #[serde(default)]
    pub imdb: Option<String>,
    #[serde(default)]
    pub thetvdb: Option<u64>,
}

impl TvMazeShow {
    fn id_for(&self, system: IdSystem) -> Option<String> {
        match system {
            IdSystem::Tvmaze => Some(self.id.to_string()),
            IdSystem::Imdb => self.externals.imdb.clone().filter(|s| !s.is_empty()),
            IdSystem::Tvdb => self.externals.thetvdb.map(|id| id.to_string()),
            IdSystem::Tmdb => None,
        }
    }
}
