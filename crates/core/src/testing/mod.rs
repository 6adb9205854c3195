//! Testing utilities and mock implementations.
//!
//! Mocks for every external seam of the orchestrator, so full cycles can
//! run against an in-memory store without qBittorrent, TMDB or trackers.
//!
//! # Example
//!
//! ```rust,ignore
//! use reuploader_core::testing::{fixtures, MockJobSource, MockTrackerUploader};
//!
//! let source = MockJobSource::new();
//! source.set_jobs(vec![fixtures::candidate_job("abc", "Heat.1995.1080p")]).await;
//!
//! let uploader = MockTrackerUploader::new();
//! uploader.fail_tracker("ATH").await;
//! ```

mod mock_identity_lookup;
mod mock_job_source;
mod mock_media_inspector;
mod mock_tracker_uploader;

pub use mock_identity_lookup::{MockIdentityLookup, RecordedFetch};
pub use mock_job_source::MockJobSource;
pub use mock_media_inspector::MockMediaInspector;
pub use mock_tracker_uploader::MockTrackerUploader;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::identity::{ContentType, ExternalIds, IdSystem, IdentityDocument};
    use crate::job_source::CandidateJob;
    use crate::media::MediaInfo;
    use crate::orchestrator::JobContext;

    /// Create a fully downloaded job under the default watch label.
    pub fn candidate_job(hash: &str, name: &str) -> CandidateJob {
        CandidateJob {
            hash: hash.to_string(),
            name: name.to_string(),
            size: 1024 * 1024 * 1024 * 4, // 4 GB
            completed: 1024 * 1024 * 1024 * 4,
            content_path: format!("/downloads/{}", name),
            save_path: "/downloads".to_string(),
            category: "GGBOT".to_string(),
        }
    }

    /// Create a resolved movie identity with only the TMDB ID set.
    pub fn movie_identity(tmdb: &str, title: &str, year: u32) -> IdentityDocument {
        IdentityDocument::from_ids(
            &ExternalIds::default().with(IdSystem::Tmdb, tmdb),
            title,
            Some(year),
            ContentType::Movie,
            None,
        )
    }

    /// Create a job context for a movie upload to the given trackers.
    pub fn job_context(hash: &str, trackers: &[&str]) -> JobContext {
        JobContext {
            job: candidate_job(hash, "Heat.1995.1080p.BluRay.x264-GRP"),
            media: MediaInfo::new("Heat", Some(1995), ContentType::Movie),
            identity: movie_identity("949", "Heat", 1995),
            upload_attempt: 1,
            trackers: trackers.iter().map(|t| t.to_string()).collect(),
        }
    }
}
