//! Canonical identity resolution.
//!
//! Starting from whatever IDs a job carries, the resolver walks the lookup
//! graph to fill in the rest:
//!
//! 1. Up to two propagation rounds over the IDs present at the start of
//!    each round.
//! 2. Direct single-hop lookups for IDs still missing.
//! 3. A TMDB title search when the TMDB ID is still unknown.
//!
//! Every edge is called at most once per resolution. Lookup errors are
//! logged and treated as "no data".
//!
//! A resolved identity cached under the same title, year and content type
//! is reused without any lookups, unless the job carries overrides or an ID
//! that contradicts the cached one.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::cache::{normalize_title, IdentityCache};
use super::lookup::{direct_edges, propagation_edges, Edge, IdentityLookup};
use super::types::{
    ContentType, ExternalIds, IdSystem, IdentityDocument, IdentityRequest, IdentityResolution,
    MediaCandidate, ABSENT_ID,
};
use crate::metrics;

/// Maximum number of propagation rounds.
const PROPAGATION_ROUNDS: usize = 2;

/// Year tolerance applied to search candidates.
const YEAR_TOLERANCE: u32 = 1;

pub struct IdentityResolver {
    lookup: Arc<dyn IdentityLookup>,
    cache: Option<IdentityCache>,
    auto_mode: bool,
    /// Largest candidate count auto mode may pick from (0 = unlimited).
    auto_select_threshold: usize,
}

impl IdentityResolver {
    pub fn new(lookup: Arc<dyn IdentityLookup>, auto_mode: bool, auto_select_threshold: usize) -> Self {
        Self {
            lookup,
            cache: None,
            auto_mode,
            auto_select_threshold,
        }
    }

    pub fn with_cache(mut self, cache: IdentityCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Resolve a canonical identity. Never fails; an unresolved TMDB ID is
    /// reported through [`IdentityResolution::is_resolved`].
    pub async fn resolve(&self, request: &IdentityRequest) -> IdentityResolution {
        let content_type = request.content_type;
        let has_overrides = request.has_overrides();
        let mut ids = request.known.overridden_by(&request.overrides);

        if !has_overrides {
            if let Some(cached) = self.read_cache(request) {
                let cached_ids = cached.ids();
                if ids.conflicts_with(&cached_ids) {
                    debug!(
                        "Cached identity for '{}' disagrees with known ids {:?}, ignoring it",
                        request.title,
                        ids.present()
                    );
                } else if cached.is_resolved() {
                    ids.fill_from(&cached_ids);
                    return IdentityResolution {
                        identity: IdentityDocument::from_ids(
                            &ids,
                            request.title.clone(),
                            request.year,
                            content_type,
                            request.mal.clone(),
                        ),
                        possible_matches: None,
                    };
                }
            }
        }

        let mut attempted = HashSet::new();
        self.expand(&mut ids, content_type, &mut attempted).await;

        let mut possible_matches = None;
        if !ids.has(IdSystem::Tmdb) {
            let candidates = self.search_candidates(request).await;
            match self.select(&candidates) {
                Some(chosen) => {
                    info!(
                        "Auto-selected TMDB {} ('{}') for '{}' out of {} candidate(s)",
                        chosen.tmdb,
                        chosen.title,
                        request.title,
                        candidates.len()
                    );
                    metrics::IDENTITY_SEARCHES
                        .with_label_values(&["selected"])
                        .inc();
                    ids.set(IdSystem::Tmdb, Some(&chosen.tmdb));
                    self.expand(&mut ids, content_type, &mut attempted).await;
                }
                None => {
                    info!(
                        "Could not pick a TMDB match for '{}' ({} candidate(s))",
                        request.title,
                        candidates.len()
                    );
                    metrics::IDENTITY_SEARCHES
                        .with_label_values(&["ambiguous"])
                        .inc();
                    possible_matches = Some(candidates);
                }
            }
        }

        let identity = IdentityDocument::from_ids(
            &ids,
            request.title.clone(),
            request.year,
            content_type,
            request.mal.clone(),
        );

        if identity.is_resolved() && !has_overrides {
            self.write_cache(request, &identity);
        }

        IdentityResolution {
            identity,
            possible_matches,
        }
    }

    fn read_cache(&self, request: &IdentityRequest) -> Option<IdentityDocument> {
        let cache = self.cache.as_ref()?;
        match cache.get(&request.title, request.year, request.content_type) {
            Ok(Some(doc)) => {
                debug!("Identity cache hit for '{}'", request.title);
                metrics::IDENTITY_CACHE.with_label_values(&["hit"]).inc();
                Some(doc)
            }
            Ok(None) => {
                metrics::IDENTITY_CACHE.with_label_values(&["miss"]).inc();
                None
            }
            Err(e) => {
                warn!("Identity cache read failed for '{}': {}", request.title, e);
                metrics::IDENTITY_CACHE.with_label_values(&["error"]).inc();
                None
            }
        }
    }

    fn write_cache(&self, request: &IdentityRequest, identity: &IdentityDocument) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&request.title, request.year, request.content_type, identity) {
                warn!("Identity cache write failed for '{}': {}", request.title, e);
            }
        }
    }

    /// Propagation rounds followed by direct lookups.
    async fn expand(
        &self,
        ids: &mut ExternalIds,
        content_type: ContentType,
        attempted: &mut HashSet<Edge>,
    ) {
        for round in 0..PROPAGATION_ROUNDS {
            let snapshot = ids.clone();
            let mut progressed = false;

            for (from, to) in propagation_edges(content_type) {
                if ids.has(to) {
                    continue;
                }
                let Some(source_id) = snapshot.get(from) else {
                    continue;
                };
                if !attempted.insert((from, to)) {
                    continue;
                }
                if let Some(found) = self.fetch(from, source_id, to, content_type).await {
                    ids.set(to, Some(&found));
                    progressed = true;
                }
            }

            debug!("Propagation round {} done, ids: {:?}", round + 1, ids.present());

            if !progressed {
                break;
            }
        }

        for (from, to) in direct_edges(content_type) {
            if ids.has(to) {
                continue;
            }
            let Some(source_id) = ids.get(from).map(str::to_string) else {
                continue;
            };
            if !attempted.insert((from, to)) {
                continue;
            }
            if let Some(found) = self.fetch(from, &source_id, to, content_type).await {
                ids.set(to, Some(&found));
            }
        }
    }

    async fn fetch(
        &self,
        from: IdSystem,
        id: &str,
        to: IdSystem,
        content_type: ContentType,
    ) -> Option<String> {
        let labels = [from.as_str(), to.as_str()];
        match self.lookup.fetch_id(from, id, to, content_type).await {
            Ok(Some(found)) if !found.trim().is_empty() && found != ABSENT_ID => {
                debug!("Lookup {} {} -> {} {}", from, id, to, found);
                metrics::IDENTITY_LOOKUPS
                    .with_label_values(&[labels[0], labels[1], "found"])
                    .inc();
                Some(found)
            }
            Ok(_) => {
                debug!("Lookup {} {} -> {} returned nothing", from, id, to);
                metrics::IDENTITY_LOOKUPS
                    .with_label_values(&[labels[0], labels[1], "empty"])
                    .inc();
                None
            }
            Err(e) => {
                warn!("Lookup {} {} -> {} failed: {}", from, id, to, e);
                metrics::IDENTITY_LOOKUPS
                    .with_label_values(&[labels[0], labels[1], "error"])
                    .inc();
                None
            }
        }
    }

    async fn search_candidates(&self, request: &IdentityRequest) -> Vec<MediaCandidate> {
        match self
            .lookup
            .search(&request.title, request.year, request.content_type)
            .await
        {
            Ok(candidates) => rank_candidates(candidates, &request.title, request.year),
            Err(e) => {
                warn!("TMDB search for '{}' failed: {}", request.title, e);
                metrics::IDENTITY_SEARCHES.with_label_values(&["error"]).inc();
                Vec::new()
            }
        }
    }

    fn select<'a>(&self, ranked: &'a [MediaCandidate]) -> Option<&'a MediaCandidate> {
        match ranked.len() {
            0 => None,
            1 => ranked.first(),
            n if self.auto_mode
                && (self.auto_select_threshold == 0 || n <= self.auto_select_threshold) =>
            {
                ranked.first()
            }
            _ => None,
        }
    }
}

/// Keep candidates within a year of the requested one and order them by
/// exact title match, then year distance. Duplicates are dropped.
pub fn rank_candidates(
    candidates: Vec<MediaCandidate>,
    title: &str,
    year: Option<u32>,
) -> Vec<MediaCandidate> {
    let wanted = normalize_title(title);
    let mut seen = HashSet::new();

    let mut ranked: Vec<MediaCandidate> = candidates
        .into_iter()
        .filter(|c| match year {
            Some(y) => c.year.is_some_and(|cy| cy.abs_diff(y) <= YEAR_TOLERANCE),
            None => true,
        })
        .filter(|c| seen.insert(c.tmdb.clone()))
        .collect();

    ranked.sort_by_key(|c| {
        let title_miss = normalize_title(&c.title) != wanted;
        let distance = match (year, c.year) {
            (Some(y), Some(cy)) => cy.abs_diff(y),
            _ => 0,
        };
        (title_miss, distance)
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteDocumentStore;
    use crate::testing::MockIdentityLookup;

    fn in_memory_cache() -> IdentityCache {
        IdentityCache::new(Arc::new(SqliteDocumentStore::in_memory().unwrap()))
    }

    fn candidate(tmdb: &str, title: &str, year: u32) -> MediaCandidate {
        MediaCandidate {
            tmdb: tmdb.to_string(),
            title: title.to_string(),
            year: Some(year),
            content_type: ContentType::Movie,
        }
    }

    #[test]
    fn test_rank_filters_by_year_tolerance() {
        let ranked = rank_candidates(
            vec![
                candidate("1", "Heat", 1986),
                candidate("2", "Heat", 1995),
                candidate("3", "Heat", 1996),
                candidate("4", "Heat", 1993),
            ],
            "Heat",
            Some(1995),
        );
        let ids: Vec<&str> = ranked.iter().map(|c| c.tmdb.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_rank_prefers_exact_title() {
        let ranked = rank_candidates(
            vec![
                candidate("1", "Heat Wave", 1995),
                candidate("2", "Heat", 1996),
                candidate("2", "Heat", 1996),
            ],
            "heat",
            Some(1995),
        );
        let ids: Vec<&str> = ranked.iter().map(|c| c.tmdb.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_known_tmdb_needs_no_search() {
        let lookup = Arc::new(MockIdentityLookup::new());
        let resolver = IdentityResolver::new(lookup.clone(), false, 0);
        let request = IdentityRequest::new("Heat", Some(1995), ContentType::Movie)
            .with_known(ExternalIds::default().with(IdSystem::Tmdb, "949"));

        let resolution = resolver.resolve(&request).await;

        assert!(resolution.is_resolved());
        assert!(resolution.possible_matches.is_none());
        assert_eq!(lookup.search_calls().await, 0);
    }

    #[tokio::test]
    async fn test_single_candidate_is_selected() {
        let lookup = Arc::new(MockIdentityLookup::new());
        lookup
            .set_search_results(vec![candidate("949", "Heat", 1995)])
            .await;
        let resolver = IdentityResolver::new(lookup.clone(), false, 1);

        let resolution = resolver
            .resolve(&IdentityRequest::new("Heat", Some(1995), ContentType::Movie))
            .await;

        assert_eq!(resolution.identity.tmdb, "949");
        assert!(resolution.possible_matches.is_none());
    }

    #[tokio::test]
    async fn test_auto_mode_respects_threshold() {
        let lookup = Arc::new(MockIdentityLookup::new());
        lookup
            .set_search_results(vec![
                candidate("1", "Heat", 1995),
                candidate("2", "Heat", 1995),
                candidate("3", "Heat", 1995),
            ])
            .await;

        let limited = IdentityResolver::new(lookup.clone(), true, 2);
        let resolution = limited
            .resolve(&IdentityRequest::new("Heat", Some(1995), ContentType::Movie))
            .await;
        assert!(!resolution.is_resolved());
        assert_eq!(resolution.possible_matches.map(|m| m.len()), Some(3));

        let unlimited = IdentityResolver::new(lookup, true, 0);
        let resolution = unlimited
            .resolve(&IdentityRequest::new("Heat", Some(1995), ContentType::Movie))
            .await;
        assert_eq!(resolution.identity.tmdb, "1");
    }

    #[tokio::test]
    async fn test_lookup_errors_are_absorbed() {
        let lookup = Arc::new(MockIdentityLookup::new());
        lookup.set_fail_all(true).await;
        let resolver = IdentityResolver::new(lookup, true, 0);

        let request = IdentityRequest::new("Heat", Some(1995), ContentType::Movie)
            .with_known(ExternalIds::default().with(IdSystem::Imdb, "tt0113277"));
        let resolution = resolver.resolve(&request).await;

        assert!(!resolution.is_resolved());
        assert_eq!(resolution.identity.imdb, "tt0113277");
        assert_eq!(resolution.possible_matches, Some(vec![]));
    }

    #[tokio::test]
    async fn test_cached_identity_is_reused_without_lookups() {
        let cache = in_memory_cache();
        let first_lookup = Arc::new(MockIdentityLookup::new());
        first_lookup
            .set_search_results(vec![candidate("949", "Heat", 1995)])
            .await;
        first_lookup
            .add_edge(IdSystem::Tmdb, "949", IdSystem::Imdb, "tt0113277")
            .await;
        let first = IdentityResolver::new(first_lookup, false, 0).with_cache(cache.clone());
        let request = IdentityRequest::new("Heat", Some(1995), ContentType::Movie);

        let resolved = first.resolve(&request).await;
        assert_eq!(resolved.identity.tmdb, "949");
        assert_eq!(resolved.identity.imdb, "tt0113277");

        let second_lookup = Arc::new(MockIdentityLookup::new());
        let second = IdentityResolver::new(second_lookup.clone(), false, 0).with_cache(cache);
        let reused = second
            .resolve(&IdentityRequest::new("Heat", Some(1995), ContentType::Movie))
            .await;

        assert_eq!(reused.identity, resolved.identity);
        assert!(reused.possible_matches.is_none());
        assert!(second_lookup.fetch_calls().await.is_empty());
        assert_eq!(second_lookup.search_calls().await, 0);
    }

    #[tokio::test]
    async fn test_override_beats_cached_identity() {
        let cache = in_memory_cache();
        let cached = IdentityDocument::from_ids(
            &ExternalIds::default().with(IdSystem::Tmdb, "949"),
            "Heat",
            Some(1995),
            ContentType::Movie,
            None,
        );
        cache
            .put("Heat", Some(1995), ContentType::Movie, &cached)
            .unwrap();

        let lookup = Arc::new(MockIdentityLookup::new());
        let resolver = IdentityResolver::new(lookup, false, 0).with_cache(cache.clone());
        let request = IdentityRequest::new("Heat", Some(1995), ContentType::Movie)
            .with_overrides(ExternalIds::default().with(IdSystem::Tmdb, "1111"));

        let resolution = resolver.resolve(&request).await;

        assert_eq!(resolution.identity.tmdb, "1111");
        assert_eq!(
            cache
                .get("Heat", Some(1995), ContentType::Movie)
                .unwrap()
                .map(|doc| doc.tmdb),
            Some("949".to_string())
        );
    }

    #[tokio::test]
    async fn test_conflicting_known_id_skips_cache() {
        let cache = in_memory_cache();
        let cached = IdentityDocument::from_ids(
            &ExternalIds::default()
                .with(IdSystem::Tmdb, "949")
                .with(IdSystem::Imdb, "tt0113277"),
            "Heat",
            Some(1995),
            ContentType::Movie,
            None,
        );
        cache
            .put("Heat", Some(1995), ContentType::Movie, &cached)
            .unwrap();

        let lookup = Arc::new(MockIdentityLookup::new());
        let resolver = IdentityResolver::new(lookup.clone(), false, 0).with_cache(cache);
        let request = IdentityRequest::new("Heat", Some(1995), ContentType::Movie)
            .with_known(ExternalIds::default().with(IdSystem::Imdb, "tt9999999"));

        let resolution = resolver.resolve(&request).await;

        assert_eq!(resolution.identity.imdb, "tt9999999");
        assert_ne!(resolution.identity.tmdb, "949");
        assert_eq!(lookup.search_calls().await, 1);
    }
}
