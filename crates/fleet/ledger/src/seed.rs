//! Allow-list seed data
//!
//! The seed file holds one serial per line. Blank lines are skipped. Lines in
//! CSV form keep only their first column.

use crate::error::LedgerResult;
use crate::traits::DeviceLedger;
use fleet_types::Serial;
use std::io::ErrorKind;
use std::path::Path;

/// Outcome of seeding the ledger from a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    /// Serials read from the file after de-blanking
    pub read: usize,

    /// Records newly inserted
    pub inserted: usize,

    /// Ledger size after seeding
    pub total: usize,
}

/// Parse newline-delimited seed content
pub fn parse_seed_list(content: &str) -> Vec<Serial> {
    content
        .lines()
        .filter_map(|line| line.split(',').next())
        .filter_map(|field| Serial::parse(field.trim().trim_matches('"')).ok())
        .collect()
}

/// Read and parse a seed file
pub async fn load_seed_file(path: impl AsRef<Path>) -> LedgerResult<Vec<Serial>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_seed_list(&content))
}

/// Seed `ledger` from the file at `path`.
///
/// A missing file is not an error: seeding is skipped and `None` returned.
pub async fn seed_from_file(
    ledger: &dyn DeviceLedger,
    path: impl AsRef<Path>,
) -> LedgerResult<Option<SeedReport>> {
    let path = path.as_ref();
    let serials = match load_seed_file(path).await {
        Ok(serials) => serials,
        Err(crate::LedgerError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Seed file not found, skipping seed");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let inserted = ledger.seed(&serials).await?;
    let total = ledger.count().await?;

    tracing::info!(
        path = %path.display(),
        read = serials.len(),
        inserted,
        total,
        "Seeded device ledger"
    );

    Ok(Some(SeedReport {
        read: serials.len(),
        inserted,
        total,
    }))
}
