//! Recording test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use fleet_gateway::{
    CommandOutcome, Credentials, DeviceGateway, GatewayError, GatewayResult, OnlineListing,
    RejectReason, Session,
};
use fleet_ledger::{DeviceLedger, LedgerError, LedgerResult};
use fleet_types::{DeviceRecord, MarkOutcome, Serial};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn sn(raw: &str) -> Serial {
    Serial::parse(raw).unwrap()
}

pub fn serials(raw: &[&str]) -> Vec<Serial> {
    raw.iter().map(|s| sn(s)).collect()
}

/// Side effect observed by a test double, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login,
    List,
    Send(String),
    Mark(String),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Scripted gateway that records every call
pub struct RecordingGateway {
    log: CallLog,
    pub login_fails: bool,
    pub online: BTreeSet<Serial>,
    pub failed_states: Vec<String>,
    pub rejected: Mutex<HashSet<String>>,
    pub send_delay: Duration,
}

impl RecordingGateway {
    pub fn new(log: CallLog, online: &[&str]) -> Self {
        Self {
            log,
            login_fails: false,
            online: serials(online).into_iter().collect(),
            failed_states: Vec::new(),
            rejected: Mutex::new(HashSet::new()),
            send_delay: Duration::ZERO,
        }
    }

    pub fn reject(&self, serial: &str) {
        self.rejected.lock().unwrap().insert(serial.to_string());
    }

    pub fn accept(&self, serial: &str) {
        self.rejected.lock().unwrap().remove(serial);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl DeviceGateway for RecordingGateway {
    async fn login(&self, _credentials: &Credentials) -> GatewayResult<Session> {
        self.log.lock().unwrap().push(Call::Login);
        if self.login_fails {
            Err(GatewayError::LoginRejected {
                code: 101,
                message: "invalid credentials".to_string(),
            })
        } else {
            Ok(Session::new("test-token"))
        }
    }

    async fn list_online_devices(&self, _session: &Session) -> OnlineListing {
        self.log.lock().unwrap().push(Call::List);
        OnlineListing {
            serials: self.online.clone(),
            failed_states: self.failed_states.clone(),
            truncated_states: Vec::new(),
        }
    }

    async fn send_command(&self, _session: &Session, serial: &Serial) -> CommandOutcome {
        self.log
            .lock()
            .unwrap()
            .push(Call::Send(serial.to_string()));

        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }

        if self.rejected.lock().unwrap().contains(serial.as_str()) {
            CommandOutcome::Rejected {
                reason: RejectReason::RemoteCode(500),
            }
        } else {
            CommandOutcome::Accepted
        }
    }
}

/// Ledger wrapper that records `mark_modified` calls
pub struct RecordingLedger {
    inner: Arc<dyn DeviceLedger>,
    log: CallLog,
    fail_marks: AtomicBool,
}

impl RecordingLedger {
    pub fn new(inner: Arc<dyn DeviceLedger>, log: CallLog) -> Self {
        Self {
            inner,
            log,
            fail_marks: AtomicBool::new(false),
        }
    }

    /// Make every following `mark_modified` fail without touching the store
    pub fn fail_marks(&self, fail: bool) {
        self.fail_marks.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceLedger for RecordingLedger {
    async fn seed(&self, serials: &[Serial]) -> LedgerResult<usize> {
        self.inner.seed(serials).await
    }

    async fn list_unmodified(&self) -> LedgerResult<BTreeSet<Serial>> {
        self.inner.list_unmodified().await
    }

    async fn list_all(&self) -> LedgerResult<Vec<DeviceRecord>> {
        self.inner.list_all().await
    }

    async fn mark_modified(&self, serial: &Serial) -> LedgerResult<MarkOutcome> {
        self.log
            .lock()
            .unwrap()
            .push(Call::Mark(serial.to_string()));
        if self.fail_marks.load(Ordering::SeqCst) {
            return Err(LedgerError::Query("disk I/O error".to_string()));
        }
        self.inner.mark_modified(serial).await
    }

    async fn count(&self) -> LedgerResult<usize> {
        self.inner.count().await
    }
}

/// Ledger whose every operation fails
pub struct BrokenLedger;

#[async_trait]
impl DeviceLedger for BrokenLedger {
    async fn seed(&self, _serials: &[Serial]) -> LedgerResult<usize> {
        Err(LedgerError::Connection("database is locked".to_string()))
    }

    async fn list_unmodified(&self) -> LedgerResult<BTreeSet<Serial>> {
        Err(LedgerError::Connection("database is locked".to_string()))
    }

    async fn list_all(&self) -> LedgerResult<Vec<DeviceRecord>> {
        Err(LedgerError::Connection("database is locked".to_string()))
    }

    async fn mark_modified(&self, _serial: &Serial) -> LedgerResult<MarkOutcome> {
        Err(LedgerError::Connection("database is locked".to_string()))
    }

    async fn count(&self) -> LedgerResult<usize> {
        Err(LedgerError::Connection("database is locked".to_string()))
    }
}
