//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! over a real orchestrator with mock collaborators injected, so the API can
//! be exercised without qBittorrent, TMDB or trackers.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reuploader_core::{
    identity::IdentityResolver,
    load_config_from_str,
    testing::{MockIdentityLookup, MockJobSource, MockTrackerUploader},
    trackers::TrackerSelector,
    ReuploadOrchestrator, SqliteDocumentStore,
};
use reuploader_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use reuploader_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_run_cycle() {
///     let fixture = TestFixture::new().await;
///     fixture.job_source.set_jobs(vec![fixtures::candidate_job("abc", "Heat.1995.1080p")]).await;
///
///     let response = fixture.post("/api/v1/orchestrator/run").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock job source - configure listed jobs
    pub job_source: Arc<MockJobSource>,
    /// Mock uploader - script tracker responses
    pub uploader: Arc<MockTrackerUploader>,
    /// Mock identity lookup - configure search results and ID edges
    pub lookup: Arc<MockIdentityLookup>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture uploading to TSP only.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = load_config_from_str(&format!(
            r#"
[database]
path = "{}"

[orchestrator]
static_trackers = ["TSP"]

[job_source.qbittorrent]
url = "http://127.0.0.1:1"
username = "admin"
password = "secret"

[[trackers]]
code = "TSP"
upload_url = "https://tsp.example/upload"
auth = {{ mode = "bearer", token = "tsp-token" }}
"#,
            db_path.display()
        ))
        .expect("Failed to parse test config");

        // Create mocks
        let job_source = Arc::new(MockJobSource::new());
        let uploader = Arc::new(MockTrackerUploader::new());
        let lookup = Arc::new(MockIdentityLookup::new());

        let store = Arc::new(SqliteDocumentStore::new(&db_path).expect("Failed to create store"));
        let valid: HashSet<String> = ["TSP".to_string()].into_iter().collect();
        let selector = TrackerSelector::new(
            true,
            config.orchestrator.static_trackers.clone(),
            valid,
        );
        let resolver = IdentityResolver::new(lookup.clone(), false, 0);

        let orchestrator = Arc::new(ReuploadOrchestrator::new(
            config.orchestrator.clone(),
            config.labels.clone(),
            store,
            job_source.clone(),
            resolver,
            selector,
            uploader.clone(),
        ));

        let state = Arc::new(AppState::new(config, orchestrator));
        let router = create_router(state);

        Self {
            router,
            job_source,
            uploader,
            lookup,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
