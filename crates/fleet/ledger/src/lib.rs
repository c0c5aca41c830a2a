//! Device ledger for the fleet daemon
//!
//! Durable table mapping serial number to modification state. Records are
//! created from the allow-list seed and only ever move from unmodified to
//! modified.

mod error;
mod memory;
mod seed;
mod sqlite;
mod traits;

pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryLedger;
pub use seed::{load_seed_file, parse_seed_list, seed_from_file, SeedReport};
pub use sqlite::SqliteLedger;
pub use traits::DeviceLedger;
