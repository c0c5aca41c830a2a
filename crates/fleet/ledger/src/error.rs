//! Error types for fleet-ledger

use fleet_types::Serial;
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Serial is not in the ledger
    #[error("Not found: {0}")]
    NotFound(Serial),

    /// Store could not be opened or reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement failed
    #[error("Query error: {0}")]
    Query(String),

    /// Row content violates the record invariants
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Seed file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
