//! Ledger trait definition

use crate::error::LedgerResult;
use async_trait::async_trait;
use fleet_types::{DeviceRecord, MarkOutcome, Serial};
use std::collections::BTreeSet;

/// Durable table of device records keyed by serial
///
/// Every operation is a single-record transaction from the caller's point of
/// view; there is no cross-record atomicity.
#[async_trait]
pub trait DeviceLedger: Send + Sync {
    /// Insert each absent serial as unmodified. Returns how many were new.
    async fn seed(&self, serials: &[Serial]) -> LedgerResult<usize>;

    /// All serials still in the unmodified state
    async fn list_unmodified(&self) -> LedgerResult<BTreeSet<Serial>>;

    /// Every record, newest first
    async fn list_all(&self) -> LedgerResult<Vec<DeviceRecord>>;

    /// Move one record to modified, stamping the current time.
    ///
    /// Fails with `LedgerError::NotFound` when the serial is absent. A second
    /// call returns `MarkOutcome::AlreadyModified` carrying the first stamp.
    async fn mark_modified(&self, serial: &Serial) -> LedgerResult<MarkOutcome>;

    /// Total number of records
    async fn count(&self) -> LedgerResult<usize>;
}
