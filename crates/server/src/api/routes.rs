use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, orchestrator, torrents};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Orchestrator
        .route("/orchestrator/status", get(orchestrator::get_status))
        .route("/orchestrator/run", post(orchestrator::run_cycle))
        .route("/orchestrator/start", post(orchestrator::start))
        .route("/orchestrator/stop", post(orchestrator::stop))
        // Tracked torrents
        .route("/torrents", get(torrents::list_torrents))
        .route("/torrents/{hash}", get(torrents::get_torrent))
        .route("/torrents/{hash}/outcomes", get(torrents::list_outcomes));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
