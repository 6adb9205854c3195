//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lookup::{IdentityLookup, LookupError};
use super::types::{ContentType, IdSystem, MediaCandidate};

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,
}

fn default_timeout_secs() -> u32 {
    30
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, LookupError> {
        if config.api_key.is_empty() {
            return Err(LookupError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn media_path(content_type: ContentType) -> &'static str {
        match content_type {
            ContentType::Movie => "movie",
            ContentType::Episode => "tv",
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, LookupError> {
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let Some(response) = check_status(response).await? else {
            return Ok(None);
        };

        let body = response.json().await.map_err(|e| {
            LookupError::ParseError(format!("Failed to parse TMDB response: {}", e))
        })?;

        Ok(Some(body))
    }

    /// Resolve a TMDB ID from an IMDb or TVDB ID via `/find`.
    pub async fn find_tmdb_id(
        &self,
        source: IdSystem,
        id: &str,
        content_type: ContentType,
    ) -> Result<Option<String>, LookupError> {
        let external_source = match source {
            IdSystem::Imdb => "imdb_id",
            IdSystem::Tvdb => "tvdb_id",
            other => {
                return Err(LookupError::Unsupported {
                    from: other,
                    to: IdSystem::Tmdb,
                })
            }
        };

        let url = format!("{}/find/{}", self.base_url, urlencoding::encode(id));

        debug!("TMDB find: {}={} ({})", external_source, id, content_type.as_str());

        let found: Option<TmdbFindResponse> = self
            .get_json(&url, &[("external_source", external_source)])
            .await?;

        Ok(found.and_then(|f| {
            let results = match content_type {
                ContentType::Movie => f.movie_results,
                ContentType::Episode => f.tv_results,
            };
            results.first().map(|r| r.id.to_string())
        }))
    }

    /// Fetch the external IDs attached to a TMDB entry.
    pub async fn external_ids(
        &self,
        tmdb_id: &str,
        content_type: ContentType,
    ) -> Result<Option<TmdbExternalIds>, LookupError> {
        let url = format!(
            "{}/{}/{}/external_ids",
            self.base_url,
            Self::media_path(content_type),
            urlencoding::encode(tmdb_id)
        );

        debug!("TMDB external ids: id={} ({})", tmdb_id, content_type.as_str());

        self.get_json(&url, &[]).await
    }

    /// Search movies or TV series by title.
    ///
    /// The year is not sent; callers apply their own tolerance.
    pub async fn search_titles(
        &self,
        query: &str,
        content_type: ContentType,
    ) -> Result<Vec<MediaCandidate>, LookupError> {
        let url = format!(
            "{}/search/{}",
            self.base_url,
            Self::media_path(content_type)
        );

        debug!("TMDB search: query='{}' ({})", query, content_type.as_str());

        let results: Option<TmdbSearchResponse> = self.get_json(&url, &[("query", query)]).await?;

        Ok(results
            .map(|r| {
                r.results
                    .into_iter()
                    .map(|item| item.into_candidate(content_type))
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Map error statuses onto [`LookupError`]; 404 becomes `Ok(None)`.
async fn check_status(response: Response) -> Result<Option<Response>, LookupError> {
    let status = response.status();
    if status == 404 {
        return Ok(None);
    }
    if status == 401 {
        return Err(LookupError::NotConfigured(
            "Invalid TMDB API key".to_string(),
        ));
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
    Ok(Some(response))
}

#[async_trait]
impl IdentityLookup for TmdbClient {
    async fn fetch_id(
        &self,
        from: IdSystem,
        id: &str,
        to: IdSystem,
        content_type: ContentType,
    ) -> Result<Option<String>, LookupError> {
        match (from, to) {
            (IdSystem::Imdb | IdSystem::Tvdb, IdSystem::Tmdb) => {
                self.find_tmdb_id(from, id, content_type).await
            }
            (IdSystem::Tmdb, IdSystem::Imdb | IdSystem::Tvdb) => {
                let ids = self.external_ids(id, content_type).await?;
                Ok(ids.and_then(|ids| ids.get(to)))
            }
            // No single TMDB call maps IMDb to TVDB; the resolver gets there
            // through imdb -> tmdb -> tvdb on the next round.
            (IdSystem::Imdb, IdSystem::Tvdb) => Ok(None),
            _ => Err(LookupError::Unsupported { from, to }),
        }
    }

    async fn search(
        &self,
        title: &str,
        _year: Option<u32>,
        content_type: ContentType,
    ) -> Result<Vec<MediaCandidate>, LookupError> {
        self.search_titles(title, content_type).await
    }
}

/// Extract the year from a TMDB/TVmaze date string (`YYYY-MM-DD`).
pub(crate) fn year_from_date(date: Option<&str>) -> Option<u32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

// ============================================================================
// TMDB API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbFindResponse {
    #[serde(default)]
    movie_results: Vec<TmdbFindResult>,
    #[serde(default)]
    tv_results: Vec<TmdbFindResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindResult {
    id: u64,
}

/// External IDs as returned by `/{movie|tv}/{id}/external_ids`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub tvdb_id: Option<u64>,
}

impl TmdbExternalIds {
    fn get(&self, system: IdSystem) -> Option<String> {
        match system {
            IdSystem::Imdb => self.imdb_id.clone().filter(|s| !s.is_empty()),
            IdSystem::Tvdb => self.tvdb_id.filter(|id| *id != 0).map(|id| id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbSearchResult>,
}

/// Movie results carry `title`/`release_date`; TV results `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
struct TmdbSearchResult {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
}

impl TmdbSearchResult {
    fn into_candidate(self, content_type: ContentType) -> MediaCandidate {
        let year = year_from_date(self.release_date.as_deref())
            .or_else(|| year_from_date(self.first_air_date.as_deref()));
        MediaCandidate {
            tmdb: self.id.to_string(),
            title: self.title.or(self.name).unwrap_or_default(),
            year,
            content_type,
        }
    }
}
