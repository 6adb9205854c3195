//! Identity types shared by the resolver, lookups and cache.

use serde::{Deserialize, Serialize};

/// Placeholder stored in an [`IdentityDocument`] for an unknown ID.
pub const ABSENT_ID: &str = "0";

/// Kind of media being identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Episode,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Episode => "episode",
        }
    }
}

/// The four external ID systems a canonical identity spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdSystem {
    Imdb,
    Tmdb,
    Tvmaze,
    Tvdb,
}

impl IdSystem {
    pub const ALL: [IdSystem; 4] = [
        IdSystem::Imdb,
        IdSystem::Tmdb,
        IdSystem::Tvmaze,
        IdSystem::Tvdb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdSystem::Imdb => "imdb",
            IdSystem::Tmdb => "tmdb",
            IdSystem::Tvmaze => "tvmaze",
            IdSystem::Tvdb => "tvdb",
        }
    }
}

impl std::fmt::Display for IdSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial set of external IDs. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvmaze: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<String>,
}

/// Treat empty strings and the `"0"` placeholder as absent.
fn normalize(id: Option<&str>) -> Option<String> {
    id.map(str::trim)
        .filter(|s| !s.is_empty() && *s != ABSENT_ID)
        .map(str::to_string)
}

impl ExternalIds {
    pub fn get(&self, system: IdSystem) -> Option<&str> {
        match system {
            IdSystem::Imdb => self.imdb.as_deref(),
            IdSystem::Tmdb => self.tmdb.as_deref(),
            IdSystem::Tvmaze => self.tvmaze.as_deref(),
            IdSystem::Tvdb => self.tvdb.as_deref(),
        }
    }

    /// Set an ID. Placeholder values clear it.
    pub fn set(&mut self, system: IdSystem, id: Option<&str>) {
        let id = normalize(id);
        match system {
            IdSystem::Imdb => self.imdb = id,
            IdSystem::Tmdb => self.tmdb = id,
            IdSystem::Tvmaze => self.tvmaze = id,
            IdSystem::Tvdb => self.tvdb = id,
        }
    }

    pub fn with(mut self, system: IdSystem, id: &str) -> Self {
        self.set(system, Some(id));
        self
    }

    pub fn has(&self, system: IdSystem) -> bool {
        self.get(system).is_some()
    }

    pub fn is_empty(&self) -> bool {
        IdSystem::ALL.iter().all(|s| !self.has(*s))
    }

    /// Systems with a known ID, in canonical order.
    pub fn present(&self) -> Vec<IdSystem> {
        IdSystem::ALL
            .iter()
            .copied()
            .filter(|s| self.has(*s))
            .collect()
    }

    /// Fill every missing ID from `other`. Existing IDs win.
    pub fn fill_from(&mut self, other: &ExternalIds) {
        for system in IdSystem::ALL {
            if !self.has(system) {
                self.set(system, other.get(system));
            }
        }
    }

    /// Whether any system is known on both sides with different values.
    pub fn conflicts_with(&self, other: &ExternalIds) -> bool {
        IdSystem::ALL.iter().any(|s| match (self.get(*s), other.get(*s)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        })
    }

    /// Copy of `self` with `other`'s IDs taking priority.
    pub fn overridden_by(&self, other: &ExternalIds) -> ExternalIds {
        let mut merged = other.clone();
        merged.fill_from(self);
        merged
    }

    /// Normalize every field, dropping placeholders.
    pub fn normalized(&self) -> ExternalIds {
        let mut ids = ExternalIds::default();
        ids.fill_from(self);
        ids
    }
}

/// Canonical cross-database identity of a piece of media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDocument {
    pub tmdb: String,
    pub imdb: String,
    pub tvmaze: String,
    pub tvdb: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mal: Option<String>,
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    pub content_type: ContentType,
}

impl IdentityDocument {
    pub fn from_ids(
        ids: &ExternalIds,
        title: impl Into<String>,
        year: Option<u32>,
        content_type: ContentType,
        mal: Option<String>,
    ) -> Self {
        let id = |system| ids.get(system).unwrap_or(ABSENT_ID).to_string();
        Self {
            tmdb: id(IdSystem::Tmdb),
            imdb: id(IdSystem::Imdb),
            tvmaze: id(IdSystem::Tvmaze),
            tvdb: id(IdSystem::Tvdb),
            mal,
            title: title.into(),
            year,
            content_type,
        }
    }

    pub fn ids(&self) -> ExternalIds {
        let mut ids = ExternalIds::default();
        ids.set(IdSystem::Imdb, Some(&self.imdb));
        ids.set(IdSystem::Tmdb, Some(&self.tmdb));
        ids.set(IdSystem::Tvmaze, Some(&self.tvmaze));
        ids.set(IdSystem::Tvdb, Some(&self.tvdb));
        ids
    }

    /// Whether the primary (TMDB) ID is known.
    pub fn is_resolved(&self) -> bool {
        self.ids().has(IdSystem::Tmdb)
    }
}

/// A search result that could be the media being identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCandidate {
    pub tmdb: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<u32>,
    pub content_type: ContentType,
}

/// Everything known about a job's media before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRequest {
    pub title: String,
    pub year: Option<u32>,
    pub content_type: ContentType,
    /// IDs found in the job itself (release name, previous record).
    pub known: ExternalIds,
    /// Operator-supplied IDs. These beat both `known` and the cache.
    pub overrides: ExternalIds,
    pub mal: Option<String>,
}

impl IdentityRequest {
    pub fn new(title: impl Into<String>, year: Option<u32>, content_type: ContentType) -> Self {
        Self {
            title: title.into(),
            year,
            content_type,
            known: ExternalIds::default(),
            overrides: ExternalIds::default(),
            mal: None,
        }
    }

    pub fn with_known(mut self, known: ExternalIds) -> Self {
        self.known = known.normalized();
        self
    }

    pub fn with_overrides(mut self, overrides: ExternalIds) -> Self {
        self.overrides = overrides.normalized();
        self
    }

    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }
}

/// Outcome of identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityResolution {
    pub identity: IdentityDocument,
    /// Ranked candidates when the title search could not pick one.
    pub possible_matches: Option<Vec<MediaCandidate>>,
}

impl IdentityResolution {
    pub fn is_resolved(&self) -> bool {
        self.identity.is_resolved()
    }
}
