//! Append-only, hash-chained audit ledger
//!
//! Newline-delimited JSON, one canonicalized entry per line. The chain is
//! strictly linear: a single writer serializes all seals, and the record
//! hash of entry N becomes the prev_hash of entry N+1.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::merkle::{canonical_json, record_hash};
use crate::types::LedgerEntry;
use crate::GENESIS_HASH;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger io: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger line {0} is not valid JSON: {1}")]
    Corrupt(usize, String),
    #[error("ledger entry not encodable: {0}")]
    Encode(String),
}

struct LedgerInner {
    path: Option<PathBuf>,
    entries: Vec<LedgerEntry>,
    last_hash: String,
}

/// Single-writer ledger. All appends go through one async lock so at most
/// one seal commits at a time.
pub struct Ledger {
    inner: Mutex<LedgerInner>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}

impl Ledger {
    /// Volatile ledger (LEDGER_PATH absent)
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                path: None,
                entries: Vec::new(),
                last_hash: GENESIS_HASH.to_string(),
            }),
        }
    }

    /// Durable ledger; re-reads any existing file and resumes the chain
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let mut entries = Vec::new();
        let mut last_hash = GENESIS_HASH.to_string();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            for (i, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let entry: LedgerEntry = serde_json::from_str(line)
                    .map_err(|e| LedgerError::Corrupt(i + 1, e.to_string()))?;
                last_hash = entry.record_hash.clone();
                entries.push(entry);
            }
        }

        Ok(Self {
            inner: Mutex::new(LedgerInner {
                path: Some(path.to_path_buf()),
                entries,
                last_hash,
            }),
        })
    }

    /// Append one entry. The writer fills `prev_hash` and `record_hash`;
    /// the file write is retried once before the error propagates to the
    /// seal stage.
    pub async fn append(&self, mut entry: LedgerEntry) -> Result<LedgerEntry, LedgerError> {
        let mut inner = self.inner.lock().await;

        entry.prev_hash = inner.last_hash.clone();
        entry.record_hash = String::new();
        let mut value =
            serde_json::to_value(&entry).map_err(|e| LedgerError::Encode(e.to_string()))?;
        entry.record_hash = record_hash(&value);

        if let Some(path) = inner.path.clone() {
            if let Some(map) = value.as_object_mut() {
                map.insert(
                    "record_hash".to_string(),
                    serde_json::Value::String(entry.record_hash.clone()),
                );
            }
            let line = canonical_json(&value);
            if let Err(first) = append_line(&path, &line) {
                tracing::warn!(error = %first, "ledger write failed; retrying once");
                append_line(&path, &line)?;
            }
        }

        inner.last_hash = entry.record_hash.clone();
        inner.entries.push(entry.clone());
        tracing::info!(session = %entry.session_id, hash = %entry.record_hash, "ledger entry sealed");
        Ok(entry)
    }

    /// Last record hash in the chain (genesis hash when empty)
    pub async fn last_hash(&self) -> String {
        self.inner.lock().await.last_hash.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The most recent n entries, oldest first
    pub async fn tail(&self, n: usize) -> Vec<LedgerEntry> {
        let inner = self.inner.lock().await;
        let start = inner.entries.len().saturating_sub(n);
        inner.entries[start..].to_vec()
    }

    /// Entry for a given session, if sealed
    pub async fn find(&self, session_id: &str) -> Option<LedgerEntry> {
        let inner = self.inner.lock().await;
        inner
            .entries
            .iter()
            .find(|e| e.session_id == session_id)
            .cloned()
    }

    /// Recompute every record hash and check the chain links
    pub async fn verify_chain(&self) -> bool {
        let inner = self.inner.lock().await;
        let mut prev = GENESIS_HASH.to_string();
        for entry in &inner.entries {
            if entry.prev_hash != prev {
                return false;
            }
            let Ok(value) = serde_json::to_value(entry) else {
                return false;
            };
            if record_hash(&value) != entry.record_hash {
                return false;
            }
            prev = entry.record_hash.clone();
        }
        true
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    file.sync_data()
}

// =============================================================================
// TESTS
// =============================================================================
