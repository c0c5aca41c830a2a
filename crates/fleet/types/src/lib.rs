//! Fleet Types - Core types for device reconciliation
//!
//! The fleet daemon reconciles the online devices reported by a remote
//! management service against a local allow-list, and issues a one-time
//! remote command to each allow-listed device the first time it is seen
//! online.
//!
//! ## Key Concepts
//!
//! - **Serial**: Unique identifier of a physical device
//! - **DeviceRecord**: Ledger entry tracking whether the command was applied
//! - **Pass**: One full login → list → intersect → act → persist cycle
//! - **PassSummary**: Counters reported at the end of a pass

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod device;
pub mod ids;
pub mod pass;

pub use device::{DeviceRecord, DeviceState, MarkOutcome};
pub use ids::{PassId, Serial, SerialError};
pub use pass::PassSummary;
