//! Reconciliation pass reporting

use crate::PassId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters reported at the end of a completed pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub pass_id: PassId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Distinct serials reported online by the remote service
    pub online: usize,

    /// Ledger serials still unmodified when the pass began
    pub unmodified_before: usize,

    /// Size of `online ∩ unmodified`
    pub candidates: usize,

    /// Commands accepted and recorded in the ledger
    pub succeeded: usize,

    /// Candidates left unmodified after this pass
    pub failed: usize,

    /// Remote states whose listing failed or was truncated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_states: Vec<String>,
}

impl PassSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.degraded_states.is_empty()
    }
}
