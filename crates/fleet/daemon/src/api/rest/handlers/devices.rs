//! Device listing handler

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use fleet_types::DeviceRecord;

/// Every ledger record, newest first
pub async fn list_devices(State(state): State<AppState>) -> ApiResult<Json<Vec<DeviceRecord>>> {
    let records = state.ledger.list_all().await?;
    tracing::debug!(count = records.len(), "Listed devices");
    Ok(Json(records))
}
