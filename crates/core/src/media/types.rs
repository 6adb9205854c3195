use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{ContentType, ExternalIds, IdentityRequest};

/// Errors from media inspection and dupe checks.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Nothing usable could be read from the job.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Title, year or content type could not be detected.
    #[error("Basic info detection failed: {0}")]
    BasicInfo(String),

    #[error("Dupe check failed: {0}")]
    DupeCheck(String),
}

/// Media attributes detected for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub year: Option<u32>,
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// IDs found in the job itself.
    #[serde(default)]
    pub embedded_ids: ExternalIds,
    /// Operator-supplied IDs for this job.
    #[serde(default)]
    pub overrides: ExternalIds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mal: Option<String>,
}

impl MediaInfo {
    pub fn new(title: impl Into<String>, year: Option<u32>, content_type: ContentType) -> Self {
        Self {
            title: title.into(),
            year,
            content_type,
            season: None,
            episode: None,
            embedded_ids: ExternalIds::default(),
            overrides: ExternalIds::default(),
            mal: None,
        }
    }

    /// Build the identity request for this media. `previous` holds IDs
    /// already stored on the record.
    pub fn identity_request(&self, previous: Option<&ExternalIds>) -> IdentityRequest {
        let mut known = self.embedded_ids.clone();
        if let Some(previous) = previous {
            known.fill_from(previous);
        }

        let mut request = IdentityRequest::new(self.title.clone(), self.year, self.content_type)
            .with_known(known)
            .with_overrides(self.overrides.clone());
        request.mal = self.mal.clone();
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdSystem;

    #[test]
    fn test_identity_request_merges_ids() {
        let mut media = MediaInfo::new("Breaking Bad", Some(2008), ContentType::Episode);
        media.embedded_ids = ExternalIds::default().with(IdSystem::Imdb, "tt0903747");
        media.overrides = ExternalIds::default().with(IdSystem::Tvdb, "81189");

        let previous = ExternalIds::default()
            .with(IdSystem::Imdb, "tt0000001")
            .with(IdSystem::Tmdb, "1396");
        let request = media.identity_request(Some(&previous));

        assert_eq!(request.known.imdb.as_deref(), Some("tt0903747"));
        assert_eq!(request.known.tmdb.as_deref(), Some("1396"));
        assert_eq!(request.overrides.tvdb.as_deref(), Some("81189"));
        assert!(request.has_overrides());
    }
}
