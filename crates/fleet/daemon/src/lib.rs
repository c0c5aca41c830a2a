//! Fleet Daemon library
//!
//! This module provides the core components for the fleet daemon:
//! - Reconciliation engine and pass scheduler
//! - REST API and the embedded status page
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult, ReconcileError};
pub use scheduler::{LastPass, Reconciler, Scheduler, TriggerOutcome};
pub use server::Server;
