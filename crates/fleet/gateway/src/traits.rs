//! Gateway trait and call outcomes

use crate::error::{GatewayError, GatewayResult};
use crate::session::{Credentials, Session};
use async_trait::async_trait;
use fleet_types::Serial;
use std::collections::BTreeSet;
use std::fmt;

/// Union of the per-state listings for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnlineListing {
    /// Deduplicated online serials
    pub serials: BTreeSet<Serial>,

    /// States whose query failed and contributed nothing
    pub failed_states: Vec<String>,

    /// States whose reported total exceeded one page
    pub truncated_states: Vec<String>,
}

impl OnlineListing {
    pub fn is_degraded(&self) -> bool {
        !self.failed_states.is_empty() || !self.truncated_states.is_empty()
    }

    /// Failed and truncated state names, in that order
    pub fn degraded_states(&self) -> Vec<String> {
        self.failed_states
            .iter()
            .chain(self.truncated_states.iter())
            .cloned()
            .collect()
    }
}

/// Why the remote service did not accept a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Transport(String),
    Timeout,
    Unauthorized,
    HttpStatus(u16),
    RemoteCode(i64),
    InvalidResponse(String),
}

impl From<GatewayError> for RejectReason {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Transport(msg) => RejectReason::Transport(msg),
            GatewayError::Timeout => RejectReason::Timeout,
            GatewayError::Unauthorized => RejectReason::Unauthorized,
            GatewayError::HttpStatus(status) => RejectReason::HttpStatus(status),
            GatewayError::RemoteCode(code) => RejectReason::RemoteCode(code),
            GatewayError::LoginRejected { code, .. } => RejectReason::RemoteCode(code),
            GatewayError::InvalidResponse(msg) => RejectReason::InvalidResponse(msg),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Transport(msg) => write!(f, "transport error: {}", msg),
            RejectReason::Timeout => f.write_str("timed out"),
            RejectReason::Unauthorized => f.write_str("unauthorized"),
            RejectReason::HttpStatus(status) => write!(f, "HTTP status {}", status),
            RejectReason::RemoteCode(code) => write!(f, "remote code {}", code),
            RejectReason::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
        }
    }
}

/// Result of a single command request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The service acknowledged the command with its success code
    Accepted,

    /// Network failure or non-success code
    Rejected { reason: RejectReason },
}

impl CommandOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CommandOutcome::Accepted)
    }
}

/// Client for the remote device management service
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Exchange credentials for a session
    async fn login(&self, credentials: &Credentials) -> GatewayResult<Session>;

    /// Union of the devices in every online state.
    ///
    /// A failed state query contributes an empty set and is reported in
    /// `OnlineListing::failed_states`; it never fails the whole listing.
    async fn list_online_devices(&self, session: &Session) -> OnlineListing;

    /// Issue the fixed remote command to one device
    async fn send_command(&self, session: &Session, serial: &Serial) -> CommandOutcome;
}
