//! Error types for fleet-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fleet_gateway::GatewayError;
use fleet_ledger::LedgerError;
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Ledger could not be opened or seeded
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Gateway client could not be built
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A one-shot pass failed
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a pass ends before acting on any device
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Step 1 failed; nothing else ran
    #[error("login failed: {0}")]
    Login(#[source] GatewayError),

    /// The unmodified set could not be read
    #[error("ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Ledger read failed
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Ledger(_) => (StatusCode::INTERNAL_SERVER_ERROR, "LEDGER_ERROR"),
        };

        tracing::error!(error = %self, "API request failed");

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::Internal("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        assert_eq!(
            ApiError::Ledger(LedgerError::Connection("closed".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reconcile_error_messages() {
        let err = ReconcileError::Login(GatewayError::Timeout);
        assert_eq!(err.to_string(), "login failed: request timed out");

        let err: DaemonError = ReconcileError::Ledger(LedgerError::Query("locked".into())).into();
        assert!(err.to_string().contains("ledger unavailable"));
    }
}
