//! Media attribute detection.

use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

use super::{MediaError, MediaInfo};
use crate::config::IdentityOverride;
use crate::identity::{ContentType, ExternalIds, IdSystem};
use crate::job_source::CandidateJob;

/// Detects title, year, content type and embedded IDs for a job.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn inspect(&self, job: &CandidateJob) -> Result<MediaInfo, MediaError>;
}

static EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})[ .]?E(\d{1,3})\b").unwrap());
static SEASON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})\b").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080p|1080i|720p|576p|480p|bluray|blu-ray|remux|web-dl|webdl|webrip|hdtv|dvdrip|x264|x265|h264|h265|hevc|proper|repack)\b",
    )
    .unwrap()
});
static IMDB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(tt\d{7,8})\b").unwrap());
static TMDB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btmdb(?:id)?[-=]?(\d+)\b").unwrap());
static TVDB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btvdb(?:id)?[-=]?(\d+)\b").unwrap());
static EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mkv|mp4|avi|m2ts|ts)$").unwrap());

/// Parses scene-style release names (`Title.Year.S01E02.1080p...`).
///
/// Operator overrides are attached by hash.
#[derive(Debug, Clone, Default)]
pub struct ReleaseNameInspector {
    overrides: HashMap<String, ExternalIds>,
}

impl ReleaseNameInspector {
    pub fn new(overrides: &[IdentityOverride]) -> Self {
        let overrides = overrides
            .iter()
            .map(|o| {
                let mut ids = ExternalIds::default();
                ids.set(IdSystem::Imdb, o.imdb.as_deref());
                ids.set(IdSystem::Tmdb, o.tmdb.as_deref());
                ids.set(IdSystem::Tvmaze, o.tvmaze.as_deref());
                ids.set(IdSystem::Tvdb, o.tvdb.as_deref());
                (o.hash.to_lowercase(), ids)
            })
            .collect();
        Self { overrides }
    }

    /// Parse a release name. Does not look at overrides.
    pub fn parse(name: &str) -> Result<MediaInfo, MediaError> {
        let name = EXTENSION_RE.replace(name.trim(), "");
        if name.trim().is_empty() {
            return Err(MediaError::Extraction("empty release name".to_string()));
        }

        let mut embedded_ids = ExternalIds::default();
        if let Some(caps) = IMDB_RE.captures(&name) {
            embedded_ids.set(IdSystem::Imdb, caps.get(1).map(|m| m.as_str()));
        }
        if let Some(caps) = TMDB_RE.captures(&name) {
            embedded_ids.set(IdSystem::Tmdb, caps.get(1).map(|m| m.as_str()));
        }
        if let Some(caps) = TVDB_RE.captures(&name) {
            embedded_ids.set(IdSystem::Tvdb, caps.get(1).map(|m| m.as_str()));
        }

        let spaced: String = name
            .chars()
            .map(|c| if c == '.' || c == '_' { ' ' } else { c })
            .collect();

        let mut cut = spaced.len();
        let mut content_type = ContentType::Movie;
        let mut season = None;
        let mut episode = None;

        if let Some(caps) = EPISODE_RE.captures(&spaced) {
            content_type = ContentType::Episode;
            season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
            if let Some(m) = caps.get(0) {
                cut = cut.min(m.start());
            }
        } else if let Some(caps) = SEASON_RE.captures(&spaced) {
            content_type = ContentType::Episode;
            season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            if let Some(m) = caps.get(0) {
                cut = cut.min(m.start());
            }
        }

        // A leading year is part of the title (e.g. "2012 2009 1080p")
        let year_match = YEAR_RE.find_iter(&spaced).find(|m| m.start() > 0);
        let year = year_match.and_then(|m| m.as_str().parse().ok());
        if let Some(m) = year_match {
            cut = cut.min(m.start());
        }

        if let Some(m) = TAG_RE.find(&spaced) {
            cut = cut.min(m.start());
        }

        let title = spaced[..cut]
            .trim_end_matches(|c: char| c.is_whitespace() || "([-".contains(c))
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if title.is_empty() {
            return Err(MediaError::BasicInfo(format!(
                "no title found in '{}'",
                name
            )));
        }

        let mut info = MediaInfo::new(title, year, content_type);
        info.season = season;
        info.episode = episode;
        info.embedded_ids = embedded_ids;
        Ok(info)
    }
}

#[async_trait]
impl MediaInspector for ReleaseNameInspector {
    async fn inspect(&self, job: &CandidateJob) -> Result<MediaInfo, MediaError> {
        let mut info = Self::parse(&job.name)?;
        if let Some(ids) = self.overrides.get(&job.hash.to_lowercase()) {
            debug!("Applying identity override for {}", job.hash);
            info.overrides = ids.clone();
        }
        Ok(info)
    }
}
