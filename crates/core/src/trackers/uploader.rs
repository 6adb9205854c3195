use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use super::TrackerRegistry;
use crate::identity::IdentityDocument;
use crate::media::MediaInfo;
use crate::metrics;
use crate::orchestrator::JobContext;

/// Errors from tracker uploads.
///
/// An `Err` is recorded as a FAILED outcome for that tracker only.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unknown tracker: {0}")]
    UnknownTracker(String),

    #[error("No credentials configured for tracker {0}")]
    MissingCredentials(String),

    #[error("Invalid configuration for tracker {tracker}: {message}")]
    InvalidConfig { tracker: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(String),
}

/// What a tracker said about an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    /// Opaque tracker response, stored on the job outcome record.
    pub response: Value,
}

impl UploadOutcome {
    pub fn success(response: Value) -> Self {
        Self {
            success: true,
            response,
        }
    }

    pub fn failed(response: Value) -> Self {
        Self {
            success: false,
            response,
        }
    }
}

/// Uploads one job to one tracker.
#[async_trait]
pub trait TrackerUploader: Send + Sync {
    async fn upload(&self, tracker: &str, context: &JobContext) -> Result<UploadOutcome, UploadError>;
}

/// Body posted to a tracker's upload endpoint.
#[derive(Debug, Serialize)]
struct UploadPayload<'a> {
    tracker: &'a str,
    hash: &'a str,
    name: &'a str,
    content_path: &'a str,
    size: u64,
    identity: &'a IdentityDocument,
    media: &'a MediaInfo,
    upload_attempt: u32,
}

/// Uploader that POSTs the job context as JSON to the tracker's upload URL.
pub struct HttpTrackerUploader {
    client: Client,
    registry: Arc<TrackerRegistry>,
}

impl HttpTrackerUploader {
    pub fn new(registry: Arc<TrackerRegistry>) -> Result<Self, UploadError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UploadError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, registry })
    }
}

/// A 2xx response still fails when the body says `"success": false`.
fn body_reports_failure(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(false)
}

#[async_trait]
impl TrackerUploader for HttpTrackerUploader {
    async fn upload(&self, tracker: &str, context: &JobContext) -> Result<UploadOutcome, UploadError> {
        let descriptor = self
            .registry
            .get(tracker)
            .ok_or_else(|| UploadError::UnknownTracker(tracker.to_string()))?;

        if !descriptor.has_credentials() {
            return Err(UploadError::MissingCredentials(descriptor.code.clone()));
        }

        let payload = UploadPayload {
            tracker: &descriptor.code,
            hash: &context.job.hash,
            name: &context.job.name,
            content_path: &context.job.content_path,
            size: context.job.size,
            identity: &context.identity,
            media: &context.media,
            upload_attempt: context.upload_attempt,
        };

        debug!("Uploading {} to {} ({})", context.job.hash, descriptor.code, descriptor.upload_url);

        let start = Instant::now();
        let request = self
            .client
            .post(&descriptor.upload_url)
            .timeout(descriptor.timeout)
            .json(&payload);

        let result = descriptor.auth.apply(request).send().await;

        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["tracker", descriptor.code.as_str()])
            .observe(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            metrics::EXTERNAL_SERVICE_REQUESTS
                .with_label_values(&["tracker", descriptor.code.as_str(), "error"])
                .inc();
            UploadError::Http(e.to_string())
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        let success = status.is_success() && !body_reports_failure(&body);
        metrics::EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&[
                "tracker",
                descriptor.code.as_str(),
                if success { "success" } else { "error" },
            ])
            .inc();

        let response = json!({"http_status": status.as_u16(), "body": body});
        Ok(if success {
            UploadOutcome::success(response)
        } else {
            UploadOutcome::failed(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TrackerAuthConfig, TrackerConfig};
    use crate::testing::fixtures;

    #[test]
    fn test_body_reports_failure() {
        assert!(body_reports_failure(&json!({"success": false, "message": "dupe"})));
        assert!(!body_reports_failure(&json!({"success": true})));
        assert!(!body_reports_failure(&json!("ok")));
    }

    #[tokio::test]
    async fn test_unknown_tracker() {
        let uploader = HttpTrackerUploader::new(Arc::new(TrackerRegistry::default())).unwrap();
        let context = fixtures::job_context("abc", &["TSP"]);

        let result = uploader.upload("TSP", &context).await;
        assert!(matches!(result, Err(UploadError::UnknownTracker(_))));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let registry = TrackerRegistry::from_config(&[TrackerConfig {
            code: "ATH".to_string(),
            upload_url: "https://ath.example/upload".to_string(),
            auth: TrackerAuthConfig::Bearer {
                token: String::new(),
            },
            timeout_secs: 5,
        }])
        .unwrap();
        let uploader = HttpTrackerUploader::new(Arc::new(registry)).unwrap();
        let context = fixtures::job_context("abc", &["ATH"]);

        let result = uploader.upload("ATH", &context).await;
        assert!(matches!(result, Err(UploadError::MissingCredentials(_))));
    }
}
