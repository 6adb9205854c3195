//! Re-upload orchestrator implementation.
//!
//! One polling loop, one job at a time:
//! init/load record -> pick trackers -> inspect -> resolve identity ->
//! per tracker (dupe check, upload, record outcome) -> relabel.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::LabelConfig;
use crate::identity::{IdentityDocument, IdentityResolver};
use crate::job_source::{CandidateJob, JobSource};
use crate::media::{DupeChecker, MediaInfo, MediaInspector, NoopDupeChecker, ReleaseNameInspector};
use crate::metrics;
use crate::store::{DocumentFilter, DocumentStore};
use crate::torrent::{PipelineFailure, TorrentError, TorrentRecord, TorrentStateMachine};
use crate::trackers::{TrackerSelector, TrackerUploader};

use super::config::OrchestratorConfig;
use super::types::{
    CycleReport, JobAbort, JobContext, JobReport, OrchestratorError, OrchestratorStatus,
};

/// Everything a cycle needs. Shared between the polling task and
/// API-triggered cycles.
struct JobPipeline {
    state: TorrentStateMachine,
    job_source: Arc<dyn JobSource>,
    resolver: IdentityResolver,
    selector: TrackerSelector,
    uploader: Arc<dyn TrackerUploader>,
    inspector: Arc<dyn MediaInspector>,
    dupe_checker: Arc<dyn DupeChecker>,
    // Held for the whole cycle so two cycles never interleave.
    cycle_lock: Mutex<()>,
    last_cycle: RwLock<Option<CycleReport>>,
    cycles_completed: AtomicU64,
}

/// The re-upload orchestrator.
pub struct ReuploadOrchestrator {
    config: OrchestratorConfig,
    pipeline: Arc<JobPipeline>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ReuploadOrchestrator {
    /// Create a new orchestrator with the release-name inspector and no
    /// dupe checking.
    pub fn new(
        config: OrchestratorConfig,
        labels: LabelConfig,
        store: Arc<dyn DocumentStore>,
        job_source: Arc<dyn JobSource>,
        resolver: IdentityResolver,
        selector: TrackerSelector,
        uploader: Arc<dyn TrackerUploader>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let state = TorrentStateMachine::new(
            store,
            Arc::clone(&job_source),
            config.retry_limit,
            labels,
        );

        let pipeline = JobPipeline {
            state,
            job_source,
            resolver,
            selector,
            uploader,
            inspector: Arc::new(ReleaseNameInspector::default()),
            dupe_checker: Arc::new(NoopDupeChecker),
            cycle_lock: Mutex::new(()),
            last_cycle: RwLock::new(None),
            cycles_completed: AtomicU64::new(0),
        };

        Self {
            config,
            pipeline: Arc::new(pipeline),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Replace the media inspector. Call before `start`.
    pub fn with_inspector(mut self, inspector: Arc<dyn MediaInspector>) -> Self {
        if let Some(pipeline) = Arc::get_mut(&mut self.pipeline) {
            pipeline.inspector = inspector;
        } else {
            warn!("Cannot replace inspector while a cycle holds the pipeline");
        }
        self
    }

    /// Replace the dupe checker. Call before `start`.
    pub fn with_dupe_checker(mut self, dupe_checker: Arc<dyn DupeChecker>) -> Self {
        if let Some(pipeline) = Arc::get_mut(&mut self.pipeline) {
            pipeline.dupe_checker = dupe_checker;
        } else {
            warn!("Cannot replace dupe checker while a cycle holds the pipeline");
        }
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Read access to records and outcomes.
    pub fn state(&self) -> &TorrentStateMachine {
        &self.pipeline.state
    }

    /// Start the polling loop. The first cycle runs immediately.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!(
            "Starting re-upload orchestrator (poll every {}s, retry limit {})",
            self.config.poll_interval_secs, self.config.retry_limit
        );

        self.spawn_poll_loop();
    }

    /// Stop the polling loop and wait for an in-flight cycle to finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping re-upload orchestrator");

        let _ = self.shutdown_tx.send(());

        // The loop exits at its next select; waiting on the lock covers a
        // cycle that is already underway.
        let _guard = self.pipeline.cycle_lock.lock().await;

        info!("Re-upload orchestrator stopped");
    }

    /// Run one cycle now. Waits if a cycle is already running.
    pub async fn run_cycle(&self) -> Result<CycleReport, OrchestratorError> {
        self.pipeline.run_cycle().await
    }

    /// Get current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        // Failure codes are open-ended, so count what is actually stored
        let mut torrents_by_status = BTreeMap::new();
        match self.pipeline.state.list(&DocumentFilter::all()) {
            Ok(records) => {
                for record in records {
                    *torrents_by_status
                        .entry(record.status.as_str().to_string())
                        .or_insert(0) += 1;
                }
            }
            Err(e) => warn!("Failed to count torrent records: {}", e),
        }

        OrchestratorStatus {
            running: self.is_running(),
            poll_interval_secs: self.config.poll_interval_secs,
            cycles_completed: self.pipeline.cycles_completed.load(Ordering::Relaxed),
            last_cycle: self.pipeline.last_cycle.read().await.clone(),
            torrents_by_status,
        }
    }

    fn spawn_poll_loop(&self) {
        let running = Arc::clone(&self.running);
        let pipeline = Arc::clone(&self.pipeline);
        let period = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Poll loop started");
            loop {
                // The first tick completes immediately.
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        info!("Poll loop received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        // `stop` clears the flag before it takes the lock.
                        let _guard = pipeline.cycle_lock.lock().await;
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        if let Err(e) = pipeline.run_cycle_locked().await {
                            warn!("Cycle error: {}", e);
                        }
                    }
                }
            }
            info!("Poll loop stopped");
        });
    }
}

impl JobPipeline {
    async fn run_cycle(&self) -> Result<CycleReport, OrchestratorError> {
        let _guard = self.cycle_lock.lock().await;
        self.run_cycle_locked().await
    }

    /// One cycle. The caller holds `cycle_lock`.
    async fn run_cycle_locked(&self) -> Result<CycleReport, OrchestratorError> {
        let started = Instant::now();
        let started_at = Utc::now();

        let jobs = match self.state.get_processable_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                metrics::CYCLES_TOTAL.with_label_values(&["failed"]).inc();
                return Err(e.into());
            }
        };
        debug!("Cycle found {} processable jobs", jobs.len());

        let mut report = CycleReport {
            started_at,
            finished_at: started_at,
            processable: jobs.len(),
            jobs: Vec::with_capacity(jobs.len()),
            errors: Vec::new(),
        };

        for job in &jobs {
            match self.process_job(job).await {
                Ok(job_report) => {
                    metrics::JOBS_PROCESSED
                        .with_label_values(&[job_report.status.as_str()])
                        .inc();
                    report.jobs.push(job_report);
                }
                Err(e) => {
                    error!("Failed to process job {} ({}): {}", job.hash, job.name, e);
                    report.errors.push(format!("{}: {}", job.hash, e));
                }
            }
        }

        report.finished_at = Utc::now();
        metrics::CYCLE_DURATION
            .with_label_values(&[])
            .observe(started.elapsed().as_secs_f64());
        metrics::CYCLES_TOTAL.with_label_values(&["completed"]).inc();

        info!(
            "Cycle finished: {} processable, {} processed, {} errors",
            report.processable,
            report.jobs.len(),
            report.errors.len()
        );

        *self.last_cycle.write().await = Some(report.clone());
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);

        Ok(report)
    }

    /// Drive one job as far as it goes this cycle. A pipeline failure ends
    /// the job with a terminal status; anything else is returned.
    async fn process_job(&self, job: &CandidateJob) -> Result<JobReport, OrchestratorError> {
        let (record, skip) = self.state.init_or_load(job)?;
        if skip {
            self.state.apply_label(&record).await;
            return Ok(JobReport::from_record(&record));
        }

        let trackers = self.target_trackers(job, &record);
        let record = self.state.set_target_trackers(&job.hash, trackers)?;

        match self.upload_job(job, &record).await {
            Err(OrchestratorError::Aborted(abort)) => {
                let record = self
                    .state
                    .record_pipeline_failure(&job.hash, &abort.failure, Some(abort.message))
                    .await?;
                Ok(JobReport::from_record(&record))
            }
            other => other,
        }
    }

    async fn upload_job(
        &self,
        job: &CandidateJob,
        record: &TorrentRecord,
    ) -> Result<JobReport, OrchestratorError> {
        let media = self.inspector.inspect(job).await.map_err(JobAbort::from)?;
        let identity = self.ensure_identity(job, record, &media).await?;

        let succeeded = self.state.succeeded_trackers(&job.hash)?;
        let context = JobContext {
            job: job.clone(),
            media,
            identity,
            upload_attempt: record.upload_attempt,
            trackers: record.target_trackers.clone(),
        };

        if context.trackers.is_empty() {
            warn!("Job {} has no target trackers", job.hash);
        }

        let mut uploaded = Vec::new();
        let mut failed = Vec::new();
        let mut already_uploaded = Vec::new();

        for tracker in &context.trackers {
            if succeeded.contains(tracker) {
                debug!("Job {} already uploaded to {}", job.hash, tracker);
                metrics::TRACKER_UPLOADS
                    .with_label_values(&[tracker.as_str(), "skipped"])
                    .inc();
                already_uploaded.push(tracker.clone());
                continue;
            }

            let is_dupe = self
                .dupe_checker
                .is_dupe(tracker, &context)
                .await
                .map_err(JobAbort::from)?;
            if is_dupe {
                info!("Job {} is a dupe on {}", job.hash, tracker);
                self.state.record_tracker_outcome(
                    &job.hash,
                    tracker,
                    false,
                    json!({ "error": "dupe", "message": format!("Release already on {}", tracker) }),
                )?;
                metrics::TRACKER_UPLOADS
                    .with_label_values(&[tracker.as_str(), "dupe"])
                    .inc();
                failed.push(tracker.clone());
                continue;
            }

            let (success, response) = match self.uploader.upload(tracker, &context).await {
                Ok(outcome) => (outcome.success, outcome.response),
                Err(e) => {
                    warn!("Upload of {} to {} failed: {}", job.hash, tracker, e);
                    (false, json!({ "error": e.to_string() }))
                }
            };

            self.state
                .record_tracker_outcome(&job.hash, tracker, success, response)?;

            let result = if success { "success" } else { "failed" };
            metrics::TRACKER_UPLOADS
                .with_label_values(&[tracker.as_str(), result])
                .inc();
            if success {
                info!("Uploaded {} to {}", job.hash, tracker);
                uploaded.push(tracker.clone());
            } else {
                failed.push(tracker.clone());
            }
        }

        let record = self
            .state
            .get(&job.hash)?
            .ok_or_else(|| TorrentError::NotFound(job.hash.clone()))?;
        self.state.apply_label(&record).await;

        let mut report = JobReport::from_record(&record);
        report.uploaded = uploaded;
        report.failed = failed;
        report.already_uploaded = already_uploaded;
        Ok(report)
    }

    /// Label hints win. Without hints, trackers stored by an earlier attempt
    /// are reused before falling back to the static list.
    fn target_trackers(&self, job: &CandidateJob, record: &TorrentRecord) -> Vec<String> {
        let hints = self.job_source.dynamic_trackers(job);
        if hints.is_empty() && !record.target_trackers.is_empty() {
            return record.target_trackers.clone();
        }

        let selection = self.selector.select(&hints);
        debug!(
            "Job {} targets {:?} ({:?})",
            job.hash, selection.trackers, selection.source
        );
        selection.trackers
    }

    /// Reuse the stored identity when it is complete and no override asks
    /// for a fresh resolution. Otherwise resolve and persist.
    async fn ensure_identity(
        &self,
        job: &CandidateJob,
        record: &TorrentRecord,
        media: &MediaInfo,
    ) -> Result<IdentityDocument, OrchestratorError> {
        if let Some(identity) = &record.identity {
            if identity.is_resolved() && media.overrides.is_empty() {
                return Ok(identity.clone());
            }
        }

        let previous = record.identity.as_ref().map(|i| i.ids());
        let request = media.identity_request(previous.as_ref());
        let resolution = self.resolver.resolve(&request).await;

        if resolution.is_resolved() {
            self.state
                .set_identity(&job.hash, resolution.identity.clone())?;
            return Ok(resolution.identity);
        }

        let message = match &resolution.possible_matches {
            Some(matches) => format!(
                "{} possible TMDB matches for '{}'",
                matches.len(),
                media.title
            ),
            None => format!("No TMDB match for '{}'", media.title),
        };
        if let Some(matches) = resolution.possible_matches {
            self.state
                .set_possible_matches(&job.hash, resolution.identity, matches)?;
        }

        Err(JobAbort::new(PipelineFailure::TmdbIdentificationFailed, message).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::identity::{ContentType, IdSystem, MediaCandidate};
    use crate::job_source::JobSourceError;
    use crate::media::MediaError;
    use crate::store::SqliteDocumentStore;
    use crate::testing::{fixtures, MockIdentityLookup, MockJobSource, MockTrackerUploader};
    use crate::torrent::{OutcomeStatus, TorrentStatus};

    struct Harness {
        orchestrator: ReuploadOrchestrator,
        job_source: Arc<MockJobSource>,
        uploader: Arc<MockTrackerUploader>,
        lookup: Arc<MockIdentityLookup>,
    }

    fn harness(static_trackers: &[&str]) -> Harness {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::in_memory().unwrap());
        let job_source = Arc::new(MockJobSource::new());
        let uploader = Arc::new(MockTrackerUploader::new());
        let lookup = Arc::new(MockIdentityLookup::new());

        let config = OrchestratorConfig {
            static_trackers: static_trackers.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let valid: HashSet<String> = ["TSP", "ATH", "BHD"].iter().map(|s| s.to_string()).collect();
        let selector = TrackerSelector::new(true, config.static_trackers.clone(), valid);
        let resolver = IdentityResolver::new(lookup.clone(), false, 0);

        let orchestrator = ReuploadOrchestrator::new(
            config,
            LabelConfig::default(),
            store,
            job_source.clone(),
            resolver,
            selector,
            uploader.clone(),
        );

        Harness {
            orchestrator,
            job_source,
            uploader,
            lookup,
        }
    }

    async fn seed_movie(h: &Harness) {
        h.lookup
            .set_search_results(vec![MediaCandidate {
                tmdb: "603".to_string(),
                title: "The Matrix".to_string(),
                year: Some(1999),
                content_type: ContentType::Movie,
            }])
            .await;
        h.lookup
            .add_edge(IdSystem::Tmdb, "603", IdSystem::Imdb, "tt0133093")
            .await;
    }

    #[tokio::test]
    async fn test_success_on_all_trackers() {
        let h = harness(&["TSP", "ATH"]);
        seed_movie(&h).await;
        h.job_source
            .set_jobs(vec![fixtures::candidate_job("abc", "The.Matrix.1999.1080p.BluRay.x264-GRP")])
            .await;

        let report = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(report.processable, 1);
        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].status, TorrentStatus::Success);
        assert_eq!(report.jobs[0].uploaded, vec!["TSP", "ATH"]);

        let record = h.orchestrator.state().get("abc").unwrap().unwrap();
        assert_eq!(record.status, TorrentStatus::Success);
        assert_eq!(record.identity.unwrap().tmdb, "603");
        assert_eq!(
            h.job_source.relabels().await,
            vec![("abc".to_string(), "GGBOT_UPLOADED".to_string())]
        );

        // Terminal now, so the next cycle ignores it
        let report = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(report.processable, 0);
        assert_eq!(h.uploader.uploads().await.len(), 2);
    }

    #[tokio::test]
    async fn test_partial_then_retry_only_failed_tracker() {
        let h = harness(&["TSP", "ATH"]);
        seed_movie(&h).await;
        h.uploader.fail_tracker("ATH").await;
        h.job_source
            .set_jobs(vec![fixtures::candidate_job("abc", "The.Matrix.1999.1080p.BluRay.x264-GRP")])
            .await;

        let report = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(report.jobs[0].status, TorrentStatus::PartiallySuccessful);
        assert_eq!(report.jobs[0].failed, vec!["ATH"]);

        h.uploader.clear_failures().await;
        let report = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(report.jobs[0].status, TorrentStatus::Success);
        assert_eq!(report.jobs[0].already_uploaded, vec!["TSP"]);
        assert_eq!(report.jobs[0].uploaded, vec!["ATH"]);

        let uploads = h.uploader.uploads().await;
        let tsp = uploads.iter().filter(|(_, t)| t == "TSP").count();
        assert_eq!(tsp, 1);
    }

    #[tokio::test]
    async fn test_unresolved_identity_is_terminal() {
        let h = harness(&["TSP"]);
        h.job_source
            .set_jobs(vec![fixtures::candidate_job("abc", "Unknown.Film.2001.1080p-GRP")])
            .await;

        let report = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(report.jobs[0].status, TorrentStatus::TmdbIdentificationFailed);
        assert!(h.uploader.uploads().await.is_empty());

        let record = h.orchestrator.state().get("abc").unwrap().unwrap();
        assert!(record.failure_message.unwrap().contains("Unknown Film"));
        assert_eq!(
            h.job_source.relabels().await,
            vec![("abc".to_string(), "GGBOT_UNIDENTIFIED".to_string())]
        );
    }

    #[tokio::test]
    async fn test_basic_info_failure() {
        let h = harness(&["TSP"]);
        h.job_source
            .set_jobs(vec![fixtures::candidate_job("abc", "...")])
            .await;

        let report = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(
            report.jobs[0].status,
            PipelineFailure::BasicInfoDetectionFailed.status()
        );
        let record = h.orchestrator.state().get("abc").unwrap().unwrap();
        assert!(record.failure_message.is_some());
    }

    struct FailingDupeChecker;

    #[async_trait::async_trait]
    impl DupeChecker for FailingDupeChecker {
        async fn is_dupe(&self, _tracker: &str, _context: &JobContext) -> Result<bool, MediaError> {
            Err(MediaError::DupeCheck("tracker search unavailable".to_string()))
        }
    }

    struct AlwaysDupe;

    #[async_trait::async_trait]
    impl DupeChecker for AlwaysDupe {
        async fn is_dupe(&self, tracker: &str, _context: &JobContext) -> Result<bool, MediaError> {
            Ok(tracker == "ATH")
        }
    }

    #[tokio::test]
    async fn test_dupe_check_error_aborts_job() {
        let h = harness(&["TSP"]);
        seed_movie(&h).await;
        let orchestrator = h.orchestrator.with_dupe_checker(Arc::new(FailingDupeChecker));
        h.job_source
            .set_jobs(vec![fixtures::candidate_job("abc", "The.Matrix.1999.1080p.BluRay.x264-GRP")])
            .await;

        let report = orchestrator.run_cycle().await.unwrap();
        assert_eq!(report.jobs[0].status, TorrentStatus::DupeCheckFailed);
        assert!(h.uploader.uploads().await.is_empty());
    }

    #[tokio::test]
    async fn test_dupe_found_records_failed_outcome() {
        let h = harness(&["TSP", "ATH"]);
        seed_movie(&h).await;
        let orchestrator = h.orchestrator.with_dupe_checker(Arc::new(AlwaysDupe));
        h.job_source
            .set_jobs(vec![fixtures::candidate_job("abc", "The.Matrix.1999.1080p.BluRay.x264-GRP")])
            .await;

        let report = orchestrator.run_cycle().await.unwrap();
        assert_eq!(report.jobs[0].status, TorrentStatus::PartiallySuccessful);

        let outcomes = orchestrator.state().outcomes("abc").unwrap();
        let ath = outcomes.iter().find(|o| o.tracker == "ATH").unwrap();
        assert_eq!(ath.status, OutcomeStatus::Failed);
        assert_eq!(ath.tracker_response["error"], "dupe");
    }

    #[tokio::test]
    async fn test_label_hints_override_static_list() {
        let h = harness(&["TSP"]);
        seed_movie(&h).await;
        let mut job = fixtures::candidate_job("abc", "The.Matrix.1999.1080p.BluRay.x264-GRP");
        job.category = "GGBOT::BHD::XYZ".to_string();
        h.job_source.set_jobs(vec![job]).await;

        h.orchestrator.run_cycle().await.unwrap();

        let uploads = h.uploader.uploads().await;
        assert_eq!(uploads, vec![("abc".to_string(), "BHD".to_string())]);
        let record = h.orchestrator.state().get("abc").unwrap().unwrap();
        assert_eq!(record.target_trackers, vec!["BHD"]);
    }

    #[tokio::test]
    async fn test_source_error_fails_cycle() {
        let h = harness(&["TSP"]);
        h.job_source
            .set_next_error(JobSourceError::ConnectionFailed("refused".to_string()))
            .await;

        let result = h.orchestrator.run_cycle().await;
        assert!(matches!(result, Err(OrchestratorError::Torrent(_))));

        // Recovers on the next cycle
        let report = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(report.processable, 0);
    }

    #[tokio::test]
    async fn test_status_counts() {
        let h = harness(&["TSP"]);
        seed_movie(&h).await;
        h.job_source
            .set_jobs(vec![
                fixtures::candidate_job("abc", "The.Matrix.1999.1080p.BluRay.x264-GRP"),
                fixtures::candidate_job("def", "..."),
            ])
            .await;

        h.orchestrator.run_cycle().await.unwrap();

        let status = h.orchestrator.status().await;
        assert!(!status.running);
        assert_eq!(status.cycles_completed, 1);
        assert_eq!(status.torrents_by_status.get("SUCCESS"), Some(&1));
        assert_eq!(
            status.torrents_by_status.get("BASIC_INFO_DETECTION_FAILED"),
            Some(&1)
        );
        assert_eq!(status.last_cycle.unwrap().jobs.len(), 2);
    }

    #[tokio::test]
    async fn test_start_stop() {
        let h = harness(&["TSP"]);
        h.orchestrator.start().await;
        assert!(h.orchestrator.is_running());

        // Second start is a no-op
        h.orchestrator.start().await;

        h.orchestrator.stop().await;
        assert!(!h.orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_start_runs_first_cycle_immediately() {
        let h = harness(&["TSP"]);
        seed_movie(&h).await;
        h.job_source
            .set_jobs(vec![fixtures::candidate_job("abc", "The.Matrix.1999.1080p.BluRay.x264-GRP")])
            .await;

        h.orchestrator.start().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.orchestrator.stop().await;

        let record = h.orchestrator.state().get("abc").unwrap().unwrap();
        assert_eq!(record.status, TorrentStatus::Success);
        assert_eq!(h.orchestrator.status().await.cycles_completed, 1);
    }

    #[tokio::test]
    async fn test_no_cycle_runs_after_stop_returns() {
        let h = harness(&["TSP"]);
        seed_movie(&h).await;
        h.job_source
            .set_jobs(vec![fixtures::candidate_job("abc", "The.Matrix.1999.1080p.BluRay.x264-GRP")])
            .await;

        h.orchestrator.start().await;
        h.orchestrator.stop().await;
        assert!(h.orchestrator.state().get("abc").unwrap().is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(h.orchestrator.state().get("abc").unwrap().is_none());
        assert!(h.uploader.uploads().await.is_empty());
        assert_eq!(h.orchestrator.status().await.cycles_completed, 0);
    }
}
