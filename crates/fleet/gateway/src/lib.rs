//! Remote device gateway for the fleet daemon
//!
//! Wraps the external device management (MES) service behind the
//! `DeviceGateway` trait:
//!
//! - `login` exchanges credentials for an explicit [`Session`]
//! - `list_online_devices` unions the per-state listings, degrading to partial
//!   results when a state query fails
//! - `send_command` issues the fixed remote command to one device
//!
//! The HTTP details live in [`MesGateway`]; everything else sees only the
//! trait and its outcome types.

#![deny(unsafe_code)]

mod config;
mod error;
mod mes;
mod schema;
mod session;
mod traits;

pub use config::{CommandParams, GatewayConfig};
pub use error::{GatewayError, GatewayResult};
pub use mes::MesGateway;
pub use session::{Credentials, Session};
pub use traits::{CommandOutcome, DeviceGateway, OnlineListing, RejectReason};
