//! qBittorrent job source.
//!
//! Watches torrents whose category starts with the configured label prefix
//! and writes result labels back as categories.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::{LabelConfig, QBittorrentConfig};
use crate::metrics;

use super::{trackers_from_label, CandidateJob, JobSource, JobSourceError};

/// qBittorrent Web API v2 job source.
pub struct QBittorrentJobSource {
    client: Client,
    config: QBittorrentConfig,
    prefix: String,
    delimiter: String,
    /// Session marker (the cookie itself lives in the client's jar).
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentJobSource {
    pub fn new(config: QBittorrentConfig, labels: &LabelConfig) -> Result<Self, JobSourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| JobSourceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            prefix: labels.prefix.clone(),
            delimiter: labels.delimiter.clone(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn map_send_error(e: reqwest::Error) -> JobSourceError {
        if e.is_timeout() {
            JobSourceError::Timeout
        } else if e.is_connect() {
            JobSourceError::ConnectionFailed(e.to_string())
        } else {
            JobSourceError::ApiError(e.to_string())
        }
    }

    /// Login and store session cookie.
    async fn login(&self) -> Result<(), JobSourceError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(JobSourceError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(JobSourceError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), JobSourceError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// Send a request, logging in again once if the session expired.
    async fn send<F>(&self, operation: &str, build: F) -> Result<String, JobSourceError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let start = Instant::now();
        let mut response = build().send().await.map_err(Self::map_send_error)?;

        if response.status().as_u16() == 403 {
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;
            response = build().send().await.map_err(Self::map_send_error)?;
        }

        metrics::EXTERNAL_SERVICE_DURATION
            .with_label_values(&["qbittorrent", operation])
            .observe(start.elapsed().as_secs_f64());

        let status = response.status();
        if !status.is_success() {
            metrics::EXTERNAL_SERVICE_REQUESTS
                .with_label_values(&["qbittorrent", operation, "error"])
                .inc();
            let body = response.text().await.unwrap_or_default();
            return Err(JobSourceError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        metrics::EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&["qbittorrent", operation, "success"])
            .inc();

        response
            .text()
            .await
            .map_err(|e| JobSourceError::ApiError(e.to_string()))
    }

    fn is_watched(&self, category: &str) -> bool {
        category.starts_with(&self.prefix)
    }
}

/// qBittorrent torrent info response (fields used here).
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    size: i64,
    completed: i64,
    #[serde(default)]
    content_path: String,
    #[serde(default)]
    save_path: String,
    #[serde(default)]
    category: String,
}

impl QBTorrentInfo {
    fn into_candidate_job(self) -> CandidateJob {
        CandidateJob {
            hash: self.hash.to_lowercase(),
            name: self.name,
            size: self.size.max(0) as u64,
            completed: self.completed.max(0) as u64,
            content_path: self.content_path,
            save_path: self.save_path,
            category: self.category,
        }
    }
}

#[async_trait]
impl JobSource for QBittorrentJobSource {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn list_candidate_jobs(&self) -> Result<Vec<CandidateJob>, JobSourceError> {
        let url = format!("{}/api/v2/torrents/info", self.base_url());
        let response = self
            .send("list", || self.client.get(&url).query(&[("sort", "added_on")]))
            .await?;

        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response)
            .map_err(|e| JobSourceError::ApiError(format!("Failed to parse response: {}", e)))?;

        let jobs: Vec<CandidateJob> = torrents
            .into_iter()
            .filter(|t| self.is_watched(&t.category))
            .map(QBTorrentInfo::into_candidate_job)
            .collect();

        debug!("qBittorrent reported {} watched job(s)", jobs.len());
        Ok(jobs)
    }

    async fn relabel(&self, hash: &str, label: &str) -> Result<(), JobSourceError> {
        let create_url = format!("{}/api/v2/torrents/createCategory", self.base_url());
        // 409 when the category already exists
        if let Err(e) = self
            .send("create_category", || {
                self.client
                    .post(&create_url)
                    .form(&[("category", label), ("savePath", "")])
            })
            .await
        {
            debug!("createCategory {} not applied: {}", label, e);
        }

        let set_url = format!("{}/api/v2/torrents/setCategory", self.base_url());
        self.send("set_category", || {
            self.client
                .post(&set_url)
                .form(&[("hashes", hash), ("category", label)])
        })
        .await?;

        debug!("Relabeled {} as {}", hash, label);
        Ok(())
    }

    fn dynamic_trackers(&self, job: &CandidateJob) -> Vec<String> {
        trackers_from_label(job, &self.prefix, &self.delimiter)
    }
}
