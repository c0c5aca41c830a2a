//! One reconciliation pass: login, list, intersect, act, persist

use crate::error::ReconcileError;
use chrono::Utc;
use fleet_gateway::{CommandOutcome, Credentials, DeviceGateway, RejectReason};
use fleet_ledger::DeviceLedger;
use fleet_types::{MarkOutcome, PassId, PassSummary, Serial};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Runs reconciliation passes against an injected ledger and gateway
pub struct Reconciler {
    ledger: Arc<dyn DeviceLedger>,
    gateway: Arc<dyn DeviceGateway>,
    credentials: Credentials,
    command_delay: Duration,
}

impl Reconciler {
    /// Create a new reconciler
    pub fn new(
        ledger: Arc<dyn DeviceLedger>,
        gateway: Arc<dyn DeviceGateway>,
        credentials: Credentials,
    ) -> Self {
        Self {
            ledger,
            gateway,
            credentials,
            command_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive commands within a pass
    pub fn with_command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn DeviceLedger> {
        &self.ledger
    }

    /// Execute one full pass.
    ///
    /// Returns `Err` only when the pass aborted before acting on any device.
    /// Per-device failures are counted in the summary instead.
    pub async fn run_once(&self) -> Result<PassSummary, ReconcileError> {
        let pass_id = PassId::generate();
        let span = tracing::info_span!("pass", pass_id = %pass_id);
        self.execute(pass_id).instrument(span).await
    }

    async fn execute(&self, pass_id: PassId) -> Result<PassSummary, ReconcileError> {
        let started_at = Utc::now();
        tracing::info!("Reconciliation pass started");

        let session = match self.gateway.login(&self.credentials).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "Login failed, aborting pass");
                return Err(ReconcileError::Login(e));
            }
        };

        let listing = self.gateway.list_online_devices(&session).await;
        let unmodified = self.ledger.list_unmodified().await.map_err(|e| {
            tracing::error!(error = %e, "Could not read unmodified devices, aborting pass");
            ReconcileError::Ledger(e)
        })?;

        let candidates: BTreeSet<Serial> = listing
            .serials
            .intersection(&unmodified)
            .cloned()
            .collect();

        tracing::info!(
            online = listing.serials.len(),
            unmodified = unmodified.len(),
            candidates = candidates.len(),
            "Computed candidates"
        );

        let mut succeeded = 0;
        let mut failed = 0;

        for (index, serial) in candidates.iter().enumerate() {
            if !session.is_valid() {
                let remaining = candidates.len() - index;
                tracing::warn!(remaining, "Session no longer valid, skipping remaining candidates");
                failed += remaining;
                break;
            }

            if index > 0 && !self.command_delay.is_zero() {
                tokio::time::sleep(self.command_delay).await;
            }

            match self.gateway.send_command(&session, serial).await {
                CommandOutcome::Accepted => match self.ledger.mark_modified(serial).await {
                    Ok(MarkOutcome::Modified { at }) => {
                        tracing::info!(serial = %serial, modified_at = %at, "Device modified");
                        succeeded += 1;
                    }
                    Ok(MarkOutcome::AlreadyModified { at }) => {
                        tracing::info!(serial = %serial, modified_at = %at, "Device was already marked modified");
                        succeeded += 1;
                    }
                    Err(e) => {
                        tracing::error!(
                            serial = %serial,
                            error = %e,
                            "Command accepted but ledger write failed; device will be retried"
                        );
                        failed += 1;
                    }
                },
                CommandOutcome::Rejected { reason } => {
                    tracing::warn!(serial = %serial, reason = %reason, "Command rejected");
                    failed += 1;
                    if reason == RejectReason::Unauthorized {
                        session.invalidate();
                    }
                }
            }
        }

        let summary = PassSummary {
            pass_id,
            started_at,
            finished_at: Utc::now(),
            online: listing.serials.len(),
            unmodified_before: unmodified.len(),
            candidates: candidates.len(),
            succeeded,
            failed,
            degraded_states: listing.degraded_states(),
        };

        tracing::info!(
            online = summary.online,
            unmodified_before = summary.unmodified_before,
            candidates = summary.candidates,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Reconciliation pass finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fleet_gateway::{GatewayError, GatewayResult, OnlineListing, Session};
    use fleet_ledger::InMemoryLedger;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn sn(raw: &str) -> Serial {
        Serial::parse(raw).unwrap()
    }

    #[derive(Default)]
    struct StubGateway {
        login_fails: bool,
        online: Vec<&'static str>,
        rejected: HashSet<&'static str>,
        unauthorized: HashSet<&'static str>,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeviceGateway for StubGateway {
        async fn login(&self, _credentials: &Credentials) -> GatewayResult<Session> {
            if self.login_fails {
                Err(GatewayError::LoginRejected {
                    code: 401,
                    message: "bad password".to_string(),
                })
            } else {
                Ok(Session::new("token"))
            }
        }

        async fn list_online_devices(&self, _session: &Session) -> OnlineListing {
            OnlineListing {
                serials: self.online.iter().map(|s| sn(s)).collect(),
                ..Default::default()
            }
        }

        async fn send_command(&self, _session: &Session, serial: &Serial) -> CommandOutcome {
            self.sent.lock().unwrap().push(serial.to_string());
            if self.unauthorized.contains(serial.as_str()) {
                CommandOutcome::Rejected {
                    reason: RejectReason::Unauthorized,
                }
            } else if self.rejected.contains(serial.as_str()) {
                CommandOutcome::Rejected {
                    reason: RejectReason::RemoteCode(500),
                }
            } else {
                CommandOutcome::Accepted
            }
        }
    }

    async fn seeded(serials: &[&str]) -> Arc<InMemoryLedger> {
        let ledger = Arc::new(InMemoryLedger::new());
        let serials: Vec<Serial> = serials.iter().map(|s| sn(s)).collect();
        ledger.seed(&serials).await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_pass_modifies_intersection_only() {
        let ledger = seeded(&["A", "B", "C"]).await;
        let gateway = Arc::new(StubGateway {
            online: vec!["B", "C", "D"],
            ..Default::default()
        });
        let reconciler = Reconciler::new(ledger.clone(), gateway.clone(), Credentials::default());

        let summary = reconciler.run_once().await.unwrap();

        assert_eq!(summary.online, 3);
        assert_eq!(summary.unmodified_before, 3);
        assert_eq!(summary.candidates, 2);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        assert!(summary.is_clean());
        assert_eq!(*gateway.sent.lock().unwrap(), vec!["B", "C"]);

        let unmodified = ledger.list_unmodified().await.unwrap();
        assert_eq!(unmodified, BTreeSet::from([sn("A")]));
    }

    #[tokio::test]
    async fn test_login_failure_aborts_before_action() {
        let ledger = seeded(&["A"]).await;
        let gateway = Arc::new(StubGateway {
            login_fails: true,
            online: vec!["A"],
            ..Default::default()
        });
        let reconciler = Reconciler::new(ledger.clone(), gateway.clone(), Credentials::default());

        let err = reconciler.run_once().await.unwrap_err();

        assert!(matches!(err, ReconcileError::Login(_)));
        assert!(gateway.sent.lock().unwrap().is_empty());
        assert_eq!(ledger.list_unmodified().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_leaves_device_unmodified() {
        let ledger = seeded(&["A", "B"]).await;
        let gateway = Arc::new(StubGateway {
            online: vec!["A", "B"],
            rejected: HashSet::from(["A"]),
            ..Default::default()
        });
        let reconciler = Reconciler::new(ledger.clone(), gateway, Credentials::default());

        let summary = reconciler.run_once().await.unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            ledger.list_unmodified().await.unwrap(),
            BTreeSet::from([sn("A")])
        );
    }

    #[tokio::test]
    async fn test_unauthorized_stops_remaining_commands() {
        let ledger = seeded(&["A", "B", "C"]).await;
        let gateway = Arc::new(StubGateway {
            online: vec!["A", "B", "C"],
            unauthorized: HashSet::from(["A"]),
            ..Default::default()
        });
        let reconciler = Reconciler::new(ledger.clone(), gateway.clone(), Credentials::default());

        let summary = reconciler.run_once().await.unwrap();

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 3);
        assert_eq!(*gateway.sent.lock().unwrap(), vec!["A"]);
        assert_eq!(ledger.list_unmodified().await.unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_delay_spaces_commands() {
        let ledger = seeded(&["A", "B", "C"]).await;
        let gateway = Arc::new(StubGateway {
            online: vec!["A", "B", "C"],
            ..Default::default()
        });
        let reconciler = Reconciler::new(ledger, gateway, Credentials::default())
            .with_command_delay(Duration::from_secs(2));

        let start = tokio::time::Instant::now();
        let summary = reconciler.run_once().await.unwrap();

        assert_eq!(summary.succeeded, 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
    }
}
