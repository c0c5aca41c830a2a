//! Pass scheduler
//!
//! Runs a pass immediately, then on a fixed interval. Passes execute inline
//! in the scheduler task, so two passes never overlap.

mod reconciler;

pub use reconciler::Reconciler;

use chrono::{DateTime, Utc};
use fleet_types::PassSummary;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

/// Result of a manual trigger request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A pass will start as soon as the scheduler picks it up
    Queued,

    /// A pass is running right now
    Busy,

    /// A trigger is already waiting
    AlreadyQueued,

    /// The scheduler loop has exited
    Stopped,
}

/// Outcome of the most recent pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct LastPass {
    /// Summary of the last pass that completed
    pub summary: Option<PassSummary>,

    /// Error of the last pass, cleared by the next completed pass
    pub error: Option<String>,

    pub finished_at: Option<DateTime<Utc>>,
}

/// Scheduler state
pub struct Scheduler {
    interval: Duration,
    reconciler: Reconciler,
    trigger_tx: mpsc::Sender<()>,
    in_flight: AtomicBool,
    last_pass: RwLock<LastPass>,
}

impl Scheduler {
    /// Create a new scheduler. The receiver is handed back to [`Scheduler::run`].
    pub fn new(interval: Duration, reconciler: Reconciler) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        let scheduler = Arc::new(Self {
            interval,
            reconciler,
            trigger_tx,
            in_flight: AtomicBool::new(false),
            last_pass: RwLock::new(LastPass::default()),
        });

        (scheduler, trigger_rx)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Request an immediate pass
    pub fn trigger(&self) -> TriggerOutcome {
        if self.is_in_flight() {
            return TriggerOutcome::Busy;
        }

        match self.trigger_tx.try_send(()) {
            Ok(()) => TriggerOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => TriggerOutcome::AlreadyQueued,
            Err(mpsc::error::TrySendError::Closed(_)) => TriggerOutcome::Stopped,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn last_pass(&self) -> LastPass {
        self.last_pass.read().await.clone()
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// A pass that has started always runs to completion before the loop
    /// observes the shutdown signal.
    pub async fn run(
        self: Arc<Self>,
        mut trigger_rx: mpsc::Receiver<()>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_secs = self.interval.as_secs(), "Scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {
                    tracing::debug!("Scheduled pass due");
                }
                Some(()) = trigger_rx.recv() => {
                    tracing::info!("Manual pass triggered");
                }
            }

            let started = Instant::now();
            self.execute_pass().await;

            // Requests made while the pass ran are covered by it
            while trigger_rx.try_recv().is_ok() {}

            if started.elapsed() >= self.interval {
                tracing::warn!(
                    elapsed_secs = started.elapsed().as_secs(),
                    interval_secs = self.interval.as_secs(),
                    "Pass overran the interval; missed ticks dropped"
                );
                ticker.reset();
            }
        }

        tracing::info!("Scheduler stopped");
    }

    async fn execute_pass(&self) {
        self.in_flight.store(true, Ordering::Release);

        let result = self.reconciler.run_once().await;

        {
            let mut last = self.last_pass.write().await;
            match result {
                Ok(summary) => {
                    last.summary = Some(summary);
                    last.error = None;
                }
                Err(e) => {
                    last.error = Some(e.to_string());
                }
            }
            last.finished_at = Some(Utc::now());
        }

        self.in_flight.store(false, Ordering::Release);
    }
}
