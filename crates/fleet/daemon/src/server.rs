//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::scheduler::Scheduler;
use fleet_ledger::DeviceLedger;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

/// Fleet daemon server: HTTP surface plus the pass scheduler
pub struct Server {
    config: DaemonConfig,
    ledger: Arc<dyn DeviceLedger>,
    scheduler: Arc<Scheduler>,
    trigger_rx: mpsc::Receiver<()>,
}

impl Server {
    /// Create a new server from already-built components
    pub fn new(
        config: DaemonConfig,
        ledger: Arc<dyn DeviceLedger>,
        scheduler: Arc<Scheduler>,
        trigger_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            config,
            ledger,
            scheduler,
            trigger_rx,
        }
    }

    /// Run until Ctrl+C, SIGTERM or the shutdown endpoint
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Create app state
        let state = AppState::new(
            self.ledger.clone(),
            self.scheduler.clone(),
            shutdown_tx.clone(),
        );

        // Create router
        let app = create_router(state);

        // Create listener
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Fleet daemon listening on {}", addr);

        // Start scheduler in background; the first pass runs right away
        let scheduler_handle = tokio::spawn(
            self.scheduler
                .clone()
                .run(self.trigger_rx, shutdown_rx.clone()),
        );

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_rx))
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Fleet daemon shutting down");

        // Stop scheduler and let an in-flight pass finish
        let _ = shutdown_tx.send(true);
        if self.scheduler.is_in_flight() {
            tracing::info!("Waiting for the in-flight pass to finish");
        }
        if let Err(e) = scheduler_handle.await {
            tracing::error!(error = %e, "Scheduler task ended abnormally");
        }

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let requested = async {
        if shutdown_rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
        _ = requested => {
            tracing::info!("Shutdown requested via API, initiating graceful shutdown");
        }
    }
}
