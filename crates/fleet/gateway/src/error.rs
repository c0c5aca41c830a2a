//! Error types for fleet-gateway

use thiserror::Error;

/// Errors raised while talking to the remote management service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Connection, DNS or I/O failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Request exceeded the client timeout
    #[error("request timed out")]
    Timeout,

    /// Service answered 401/403; the session is no longer usable
    #[error("unauthorized")]
    Unauthorized,

    /// Non-success HTTP status other than 401/403
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Login answered with a non-success code
    #[error("login rejected (code {code}): {message}")]
    LoginRejected { code: i64, message: String },

    /// Non-success envelope code on a data call
    #[error("remote code {0}")]
    RemoteCode(i64),

    /// Body did not match the expected schema
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
