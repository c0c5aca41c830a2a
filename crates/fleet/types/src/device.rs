//! Device records held by the ledger
//!
//! A record starts `Unmodified` and moves to `Modified` exactly once. The
//! `modified_at` stamp is set by that transition and never rewritten.

use crate::Serial;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Modification state of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    /// The remote command has not been accepted for this device yet
    Unmodified,

    /// The remote command was accepted and recorded
    Modified,
}

impl DeviceState {
    pub fn is_modified(&self) -> bool {
        matches!(self, DeviceState::Modified)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Unmodified => f.write_str("unmodified"),
            DeviceState::Modified => f.write_str("modified"),
        }
    }
}

/// Result of a `Unmodified -> Modified` transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The record transitioned now
    Modified { at: DateTime<Utc> },

    /// The record was already modified; `at` is the original stamp
    AlreadyModified { at: DateTime<Utc> },
}

impl MarkOutcome {
    /// The authoritative modification time
    pub fn modified_at(&self) -> DateTime<Utc> {
        match self {
            MarkOutcome::Modified { at } | MarkOutcome::AlreadyModified { at } => *at,
        }
    }
}

/// A ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Device serial, primary key
    pub serial: Serial,

    /// Current modification state
    pub state: DeviceState,

    /// Set exactly once, when `state` becomes `Modified`
    pub modified_at: Option<DateTime<Utc>>,

    /// Ledger insertion time
    pub created_at: DateTime<Utc>,
}

impl DeviceRecord {
    /// A freshly seeded record
    pub fn unmodified(serial: Serial, created_at: DateTime<Utc>) -> Self {
        Self {
            serial,
            state: DeviceState::Unmodified,
            modified_at: None,
            created_at,
        }
    }

    /// Apply the one-way transition, keeping the first stamp if already modified
    pub fn mark_modified(&mut self, at: DateTime<Utc>) -> MarkOutcome {
        match (self.state, self.modified_at) {
            (DeviceState::Modified, Some(first)) => MarkOutcome::AlreadyModified { at: first },
            _ => {
                self.state = DeviceState::Modified;
                self.modified_at = Some(at);
                MarkOutcome::Modified { at }
            }
        }
    }

    pub fn is_modified(&self) -> bool {
        self.state.is_modified()
    }
}
