//! In-memory ledger implementation

use crate::error::{LedgerError, LedgerResult};
use crate::traits::DeviceLedger;
use async_trait::async_trait;
use chrono::Utc;
use fleet_types::{DeviceRecord, MarkOutcome, Serial};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory ledger for development and testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    records: Arc<RwLock<HashMap<Serial, DeviceRecord>>>,
}

impl InMemoryLedger {
    /// Create an empty in-memory ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a single record
    pub async fn get(&self, serial: &Serial) -> Option<DeviceRecord> {
        self.records.read().await.get(serial).cloned()
    }
}

#[async_trait]
impl DeviceLedger for InMemoryLedger {
    async fn seed(&self, serials: &[Serial]) -> LedgerResult<usize> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let mut inserted = 0;

        for serial in serials {
            if !records.contains_key(serial) {
                records.insert(serial.clone(), DeviceRecord::unmodified(serial.clone(), now));
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    async fn list_unmodified(&self) -> LedgerResult<BTreeSet<Serial>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| !r.is_modified())
            .map(|r| r.serial.clone())
            .collect())
    }

    async fn list_all(&self) -> LedgerResult<Vec<DeviceRecord>> {
        let records = self.records.read().await;
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.serial.cmp(&b.serial))
        });
        Ok(all)
    }

    async fn mark_modified(&self, serial: &Serial) -> LedgerResult<MarkOutcome> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(serial)
            .ok_or_else(|| LedgerError::NotFound(serial.clone()))?;
        Ok(record.mark_modified(Utc::now()))
    }

    async fn count(&self) -> LedgerResult<usize> {
        Ok(self.records.read().await.len())
    }
}
