//! Health and status handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use crate::scheduler::LastPass;
use axum::{extract::State, Json};
use fleet_types::PassSummary;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub devices: DeviceStats,
    pub last_pass: Option<PassSummary>,
    pub last_error: Option<String>,
    pub pass_in_flight: bool,
}

/// Ledger counts
#[derive(Debug, Serialize)]
pub struct DeviceStats {
    pub total: usize,
    pub unmodified: usize,
    pub modified: usize,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> ApiResult<Json<DaemonStatusResponse>> {
    let total = state.ledger.count().await?;
    let unmodified = state.ledger.list_unmodified().await?.len();
    let LastPass { summary, error, .. } = state.scheduler.last_pass().await;

    Ok(Json(DaemonStatusResponse {
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        devices: DeviceStats {
            total,
            unmodified,
            modified: total.saturating_sub(unmodified),
        },
        last_pass: summary,
        last_error: error,
        pass_in_flight: state.scheduler.is_in_flight(),
    }))
}
