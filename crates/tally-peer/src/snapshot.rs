//! JSON snapshots of contract world state.
//!
//! One file per contract, `<contract>.json`, inside the state directory.
//! Values are arbitrary bytes and are stored base64-encoded. Files are
//! written to a temporary name unique to the save and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tally_ledger::KeyValue;

use crate::error::{PeerError, Result};

const EXTENSION: &str = "json";

static SAVE_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    contract: String,
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    key: String,
    value: String,
}

/// Contract state as saved on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSnapshot {
    /// Contract name.
    pub contract: String,
    /// Committed entries, in key order.
    pub entries: Vec<KeyValue>,
}

/// Directory of contract snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Snapshots under `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The state directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, contract: &str) -> PathBuf {
        self.dir.join(format!("{contract}.{EXTENSION}"))
    }

    /// Write the snapshot of `contract`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, contract: &str, entries: &[KeyValue]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let file = SnapshotFile {
            contract: contract.to_string(),
            entries: entries
                .iter()
                .map(|(key, value)| SnapshotEntry {
                    key: key.clone(),
                    value: STANDARD.encode(value),
                })
                .collect(),
        };
        let path = self.path_for(contract);
        let seq = SAVE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{EXTENSION}.{}-{seq}.tmp", std::process::id()));
        fs::write(&tmp, serde_json::to_vec_pretty(&file)?)?;
        fs::rename(&tmp, &path)?;
        debug!(contract = %contract, entries = entries.len(), path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Read one snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed.
    pub fn load(&self, path: &Path) -> Result<ContractSnapshot> {
        let bytes = fs::read(path)?;
        let file: SnapshotFile = serde_json::from_slice(&bytes)?;
        let entries = file
            .entries
            .into_iter()
            .map(|entry| {
                let value = STANDARD.decode(&entry.value).map_err(|e| {
                    PeerError::Snapshot(format!(
                        "bad value for key {:?} in {}: {e}",
                        entry.key,
                        path.display()
                    ))
                })?;
                Ok((entry.key, value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ContractSnapshot {
            contract: file.contract,
            entries,
        })
    }

    /// Every snapshot in the directory, sorted by contract name.
    ///
    /// A missing directory holds no snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any snapshot is unreadable.
    pub fn load_all(&self) -> Result<Vec<ContractSnapshot>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                snapshots.push(self.load(&path)?);
            }
        }
        snapshots.sort_by(|a, b| a.contract.cmp(&b.contract));
        debug!(dir = %self.dir.display(), contracts = snapshots.len(), "snapshots loaded");
        Ok(snapshots)
    }
}
