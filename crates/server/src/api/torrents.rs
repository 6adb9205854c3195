//! Tracked torrent API handlers. Read-only.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use reuploader_core::store::DocumentFilter;
use reuploader_core::torrent::{JobOutcome, TorrentRecord};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TorrentFilterParams {
    /// Status literal, e.g. `FAILED`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TorrentListResponse {
    pub torrents: Vec<TorrentRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct OutcomeListResponse {
    pub hash: String,
    pub outcomes: Vec<JobOutcome>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn not_found(hash: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Torrent {} is not tracked", hash),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// List tracked torrents, oldest first
pub async fn list_torrents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TorrentFilterParams>,
) -> Result<Json<TorrentListResponse>, ApiError> {
    let mut filter = DocumentFilter::new();
    if let Some(status) = &params.status {
        filter = filter.with_eq("status", status.to_uppercase());
    }
    if let Some(limit) = params.limit {
        filter = filter.with_limit(limit);
    }
    if let Some(offset) = params.offset {
        filter = filter.with_offset(offset);
    }

    let torrents = state
        .orchestrator()
        .state()
        .list(&filter)
        .map_err(internal_error)?;
    let count = torrents.len();

    Ok(Json(TorrentListResponse { torrents, count }))
}

/// Get a single tracked torrent
pub async fn get_torrent(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<TorrentRecord>, ApiError> {
    match state.orchestrator().state().get(&hash) {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(not_found(&hash)),
        Err(e) => Err(internal_error(e)),
    }
}

/// Per-tracker outcomes for a torrent, oldest first
pub async fn list_outcomes(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<OutcomeListResponse>, ApiError> {
    let orchestrator = state.orchestrator();
    if orchestrator.state().get(&hash).map_err(internal_error)?.is_none() {
        return Err(not_found(&hash));
    }

    let outcomes = orchestrator.state().outcomes(&hash).map_err(internal_error)?;
    let count = outcomes.len();

    Ok(Json(OutcomeListResponse {
        hash,
        outcomes,
        count,
    }))
}
