use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::SnapshotError;
use crate::models::Transaction;

/// Load the transaction snapshot. A missing file is not an error: the
/// server starts empty until a backup has been imported.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Transaction>, SnapshotError> {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{} not found, starting with no transactions", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let transactions: Vec<Transaction> = serde_json::from_str(&raw)?;
    info!("Loaded {} transactions from {}", transactions.len(), path.display());
    Ok(transactions)
}

/// Write the snapshot as a pretty-printed JSON array
pub fn save(path: impl AsRef<Path>, transactions: &[Transaction]) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(transactions)?)?;
    info!("Saved {} transactions to {}", transactions.len(), path.display());
    Ok(())
}

/// Snapshot file present on disk?
pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}
