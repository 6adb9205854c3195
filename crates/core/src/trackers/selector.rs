//! Dynamic tracker selection from job labels.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

/// Parse tracker codes out of a label like `GGBOT::TSP::ATH::`.
///
/// The first segment must be exactly `prefix`. Empty segments are dropped,
/// codes are upper-cased and duplicates removed, keeping label order.
pub fn parse_label_trackers(label: &str, prefix: &str, delimiter: &str) -> Vec<String> {
    let mut segments = label.split(delimiter);
    if segments.next().map(str::trim) != Some(prefix) {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    segments
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Where a tracker selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Dynamic,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub trackers: Vec<String>,
    pub source: SelectionSource,
}

/// Picks target trackers for a job.
#[derive(Debug, Clone)]
pub struct TrackerSelector {
    enabled: bool,
    static_trackers: Vec<String>,
    /// Trackers with usable credentials.
    valid: HashSet<String>,
}

impl TrackerSelector {
    pub fn new(enabled: bool, static_trackers: Vec<String>, valid: HashSet<String>) -> Self {
        Self {
            enabled,
            static_trackers,
            valid: valid.into_iter().map(|c| c.to_uppercase()).collect(),
        }
    }

    pub fn static_trackers(&self) -> &[String] {
        &self.static_trackers
    }

    /// Intersect label hints with the valid set, keeping hint order.
    /// Falls back to the static list, unchanged, when selection is disabled
    /// or nothing survives.
    pub fn select(&self, hints: &[String]) -> Selection {
        if self.enabled {
            let trackers: Vec<String> = hints
                .iter()
                .map(|h| h.to_uppercase())
                .filter(|h| self.valid.contains(h))
                .collect();

            if !trackers.is_empty() {
                return Selection {
                    trackers,
                    source: SelectionSource::Dynamic,
                };
            }
            debug!("No usable tracker in hints {:?}, using static list", hints);
        }

        Selection {
            trackers: self.static_trackers.clone(),
            source: SelectionSource::Static,
        }
    }

    pub fn select_for_label(&self, label: &str, prefix: &str, delimiter: &str) -> Selection {
        self.select(&parse_label_trackers(label, prefix, delimiter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(enabled: bool) -> TrackerSelector {
        TrackerSelector::new(
            enabled,
            vec!["BHD".to_string(), "TSP".to_string()],
            ["TSP", "ATH", "BHD"].iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(
            parse_label_trackers("GGBOT::TSP::ATH", "GGBOT", "::"),
            vec!["TSP", "ATH"]
        );
        assert_eq!(
            parse_label_trackers("GGBOT::tsp::::ATH::TSP::", "GGBOT", "::"),
            vec!["TSP", "ATH"]
        );
        assert!(parse_label_trackers("GGBOT::", "GGBOT", "::").is_empty());
        assert!(parse_label_trackers("GGBOT", "GGBOT", "::").is_empty());
        assert!(parse_label_trackers("GGBOT_FAILED", "GGBOT", "::").is_empty());
        assert!(parse_label_trackers("OTHER::TSP", "GGBOT", "::").is_empty());
    }

    #[test]
    fn test_select_intersects_valid_set() {
        let selection = selector(true).select_for_label("GGBOT::TSP::ATH", "GGBOT", "::");
        assert_eq!(selection.trackers, vec!["TSP", "ATH"]);
        assert_eq!(selection.source, SelectionSource::Dynamic);

        let selection = selector(true).select_for_label("GGBOT::PTP::ATH", "GGBOT", "::");
        assert_eq!(selection.trackers, vec!["ATH"]);
    }

    #[test]
    fn test_empty_label_falls_back_to_static() {
        let selection = selector(true).select_for_label("GGBOT::", "GGBOT", "::");
        assert_eq!(selection.trackers, vec!["BHD", "TSP"]);
        assert_eq!(selection.source, SelectionSource::Static);

        let selection = selector(true).select_for_label("GGBOT::PTP", "GGBOT", "::");
        assert_eq!(selection.source, SelectionSource::Static);
    }

    #[test]
    fn test_disabled_selection_uses_static() {
        let selection = selector(false).select_for_label("GGBOT::ATH", "GGBOT", "::");
        assert_eq!(selection.trackers, vec!["BHD", "TSP"]);
        assert_eq!(selection.source, SelectionSource::Static);
    }
}
