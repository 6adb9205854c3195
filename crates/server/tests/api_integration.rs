//! API integration tests against an in-process router.

mod common;

use axum::http::StatusCode;
use common::{fixtures, TestFixture};
use reuploader_core::identity::{ContentType, MediaCandidate};

async fn seed_heat(fixture: &TestFixture) {
    fixture
        .lookup
        .set_search_results(vec![MediaCandidate {
            tmdb: "949".to_string(),
            title: "Heat".to_string(),
            year: Some(1995),
            content_type: ContentType::Movie,
        }])
        .await;
}

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["job_source"]["password_configured"], true);
    assert_eq!(response.body["trackers"][0]["code"], "TSP");
    assert_eq!(response.body["trackers"][0]["auth_mode"], "bearer");
    assert!(!response.text.contains("secret"));
    assert!(!response.text.contains("tsp-token"));
}

#[tokio::test]
async fn test_run_cycle_and_inspect_torrent() {
    let fixture = TestFixture::new().await;
    seed_heat(&fixture).await;
    fixture
        .job_source
        .set_jobs(vec![fixtures::candidate_job("abc", "Heat.1995.1080p.BluRay.x264-GRP")])
        .await;

    let response = fixture.post("/api/v1/orchestrator/run").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["processable"], 1);
    assert_eq!(response.body["jobs"][0]["status"], "SUCCESS");

    let response = fixture.get("/api/v1/torrents/abc").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "SUCCESS");
    assert_eq!(response.body["upload_attempt"], 1);
    assert_eq!(response.body["identity"]["tmdb"], "949");

    let response = fixture.get("/api/v1/torrents/abc/outcomes").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 1);
    assert_eq!(response.body["outcomes"][0]["tracker"], "TSP");
    assert_eq!(response.body["outcomes"][0]["status"], "SUCCESS");
}

#[tokio::test]
async fn test_list_torrents_by_status() {
    let fixture = TestFixture::new().await;
    seed_heat(&fixture).await;
    fixture.uploader.fail_tracker("TSP").await;
    fixture
        .job_source
        .set_jobs(vec![
            fixtures::candidate_job("abc", "Heat.1995.1080p.BluRay.x264-GRP"),
            fixtures::candidate_job("def", "...."),
        ])
        .await;

    fixture.post("/api/v1/orchestrator/run").await;

    let response = fixture.get("/api/v1/torrents").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 2);

    let response = fixture.get("/api/v1/torrents?status=failed").await;
    assert_eq!(response.body["count"], 1);
    assert_eq!(response.body["torrents"][0]["hash"], "abc");

    let response = fixture
        .get("/api/v1/torrents?status=BASIC_INFO_DETECTION_FAILED")
        .await;
    assert_eq!(response.body["count"], 1);
    assert_eq!(response.body["torrents"][0]["hash"], "def");
}

#[tokio::test]
async fn test_unknown_torrent_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/torrents/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("nope"));

    let response = fixture.get("/api/v1/torrents/nope/outcomes").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_orchestrator_status() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/orchestrator/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["running"], false);
    assert_eq!(response.body["cycles_completed"], 0);

    fixture.post("/api/v1/orchestrator/run").await;

    let response = fixture.get("/api/v1/orchestrator/status").await;
    assert_eq!(response.body["cycles_completed"], 1);
    assert_eq!(response.body["last_cycle"]["processable"], 0);
}

#[tokio::test]
async fn test_start_and_stop() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/v1/orchestrator/start").await;
    assert_eq!(response.status, StatusCode::OK);
    let response = fixture.get("/api/v1/orchestrator/status").await;
    assert_eq!(response.body["running"], true);

    let response = fixture.post("/api/v1/orchestrator/stop").await;
    assert_eq!(response.status, StatusCode::OK);
    let response = fixture.get("/api/v1/orchestrator/status").await;
    assert_eq!(response.body["running"], false);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("reuploader_http_requests_total"));
    assert!(response.text.contains("reuploader_orchestrator_running"));
}
