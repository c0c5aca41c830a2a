//! Pass triggering and lifecycle handlers

use crate::api::rest::state::AppState;
use crate::scheduler::TriggerOutcome;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Response body for manual pass requests
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub status: String,
    pub message: String,
}

/// Request an immediate reconciliation pass
pub async fn trigger_reconcile(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReconcileResponse>) {
    let (status, label, message) = match state.scheduler.trigger() {
        TriggerOutcome::Queued => (StatusCode::ACCEPTED, "queued", "Pass queued"),
        TriggerOutcome::Busy => (StatusCode::CONFLICT, "busy", "A pass is already running"),
        TriggerOutcome::AlreadyQueued => (
            StatusCode::CONFLICT,
            "already_queued",
            "A pass is already queued",
        ),
        TriggerOutcome::Stopped => (
            StatusCode::SERVICE_UNAVAILABLE,
            "stopped",
            "Scheduler is not running",
        ),
    };

    tracing::info!(outcome = label, "Manual pass requested");

    (
        status,
        Json(ReconcileResponse {
            status: label.to_string(),
            message: message.to_string(),
        }),
    )
}

/// Response body for system shutdown requests.
#[derive(Debug, Serialize)]
pub struct ShutdownResponse {
    pub status: String,
    pub message: String,
}

/// Request a graceful daemon shutdown.
pub async fn shutdown_daemon(State(state): State<AppState>) -> Json<ShutdownResponse> {
    if let Err(err) = state.shutdown_tx.send(true) {
        tracing::warn!("Failed to send shutdown signal: {}", err);
        return Json(ShutdownResponse {
            status: "error".to_string(),
            message: "Unable to signal shutdown".to_string(),
        });
    }

    Json(ShutdownResponse {
        status: "accepted".to_string(),
        message: "Shutdown signal sent".to_string(),
    })
}
