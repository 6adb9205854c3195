use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reuploader_core::{
    identity::{CombinedLookup, IdentityCache, IdentityResolver},
    job_source::QBittorrentJobSource,
    load_config,
    media::ReleaseNameInspector,
    trackers::{HttpTrackerUploader, TrackerRegistry, TrackerSelector},
    validate_config, DocumentStore, ReuploadOrchestrator, SqliteDocumentStore,
};

use reuploader_server::api::create_router;
use reuploader_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("REUPLOADER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded successfully (hash {})", &config_hash[..16]);
    info!("Database path: {:?}", config.database.path);

    // Create document store
    let store: Arc<dyn DocumentStore> = Arc::new(
        SqliteDocumentStore::new(&config.database.path)
            .context("Failed to create document store")?,
    );
    info!("Document store initialized");

    // Create job source
    let qbit = &config.job_source.qbittorrent;
    info!("Initializing qBittorrent job source at {}", qbit.url);
    let job_source = Arc::new(
        QBittorrentJobSource::new(qbit.clone(), &config.labels)
            .context("Failed to create qBittorrent job source")?,
    );

    // Create identity resolver
    let lookup = CombinedLookup::from_config(
        config.identity.tmdb.as_ref(),
        config.identity.tvmaze.as_ref(),
    )
    .context("Failed to create identity lookup clients")?;
    if !lookup.has_tmdb() {
        warn!("TMDB not configured, identities can only come from overrides and TVmaze");
    }
    if lookup.has_tvmaze() {
        info!("TVmaze lookups enabled");
    }
    let resolver = IdentityResolver::new(
        Arc::new(lookup),
        config.orchestrator.auto_mode,
        config.orchestrator.tmdb_auto_select_threshold,
    )
    .with_cache(IdentityCache::new(Arc::clone(&store)));

    // Create tracker registry, selector and uploader
    let registry = Arc::new(
        TrackerRegistry::from_config(&config.trackers)
            .context("Failed to build tracker registry")?,
    );
    let valid_trackers = registry.valid_codes();
    info!(
        "Tracker registry: {} configured, {} with credentials",
        registry.len(),
        valid_trackers.len()
    );
    let selector = TrackerSelector::new(
        config.orchestrator.dynamic_tracker_selection_enabled,
        config.orchestrator.static_trackers.clone(),
        valid_trackers,
    );
    let uploader = Arc::new(
        HttpTrackerUploader::new(Arc::clone(&registry))
            .context("Failed to create tracker uploader")?,
    );

    // Create orchestrator
    let orchestrator = Arc::new(
        ReuploadOrchestrator::new(
            config.orchestrator.clone(),
            config.labels.clone(),
            Arc::clone(&store),
            job_source,
            resolver,
            selector,
            uploader,
        )
        .with_inspector(Arc::new(ReleaseNameInspector::new(
            &config.identity.overrides,
        ))),
    );

    if config.orchestrator.enabled {
        orchestrator.start().await;
        info!("Re-upload orchestrator started");
    } else {
        info!("Orchestrator disabled in config, cycles run only on request");
    }

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&orchestrator)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop orchestrator if running
    if orchestrator.is_running() {
        info!("Stopping orchestrator...");
        orchestrator.stop().await;
    }

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
