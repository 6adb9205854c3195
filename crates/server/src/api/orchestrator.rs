//! Orchestrator API handlers.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use reuploader_core::orchestrator::{CycleReport, OrchestratorStatus};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct OrchestratorErrorResponse {
    pub error: String,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get orchestrator status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatus> {
    Json(state.orchestrator().status().await)
}

/// Run one cycle now and return its report.
/// Waits for a cycle that is already in progress.
pub async fn run_cycle(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CycleReport>, (StatusCode, Json<OrchestratorErrorResponse>)> {
    state
        .orchestrator()
        .run_cycle()
        .await
        .map(Json)
        .map_err(|e| {
            (
                StatusCode::BAD_GATEWAY,
                Json(OrchestratorErrorResponse {
                    error: e.to_string(),
                }),
            )
        })
}

/// Start the polling loop
pub async fn start(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.orchestrator().start().await;
    Json(MessageResponse {
        message: "Orchestrator started".to_string(),
    })
}

/// Stop the polling loop
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.orchestrator().stop().await;
    Json(MessageResponse {
        message: "Orchestrator stopped".to_string(),
    })
}
