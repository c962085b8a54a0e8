//! Merkle sealer: canonical hashes binding a session at seal time
//!
//! The seal is a four-leaf binary tree over (session_id, verdict, query,
//! timestamp). Parent = SHA-256(left || "|" || right). The record hash of
//! a ledger entry is SHA-256 over its canonical JSON with the record_hash
//! field excluded.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a string
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// The four seal leaves, in tree order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealLeaves {
    pub session_id: String,
    pub verdict: String,
    pub query: String,
    pub timestamp_secs: i64,
}

impl SealLeaves {
    /// Hash each domain-tagged leaf
    fn leaf_hashes(&self) -> [String; 4] {
        [
            sha256_hex(&format!("session:{}", self.session_id)),
            sha256_hex(&format!("verdict:{}", self.verdict)),
            sha256_hex(&format!("query:{}", self.query)),
            sha256_hex(&format!("timestamp:{}", self.timestamp_secs)),
        ]
    }

    /// Merkle root over the four leaves
    pub fn root(&self) -> String {
        let leaves = self.leaf_hashes();
        let left = parent(&leaves[0], &leaves[1]);
        let right = parent(&leaves[2], &leaves[3]);
        parent(&left, &right)
    }
}

fn parent(left: &str, right: &str) -> String {
    sha256_hex(&format!("{}|{}", left, right))
}

/// Canonical JSON: UTF-8, sorted keys, no insignificant whitespace.
/// serde_json already emits compact output; objects are re-keyed in
/// sorted order recursively.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let elems: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", elems.join(","))
        }
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Record hash of a ledger entry: canonical JSON with `record_hash`
/// removed, then SHA-256
pub fn record_hash(entry: &Value) -> String {
    let mut stripped = entry.clone();
    if let Some(map) = stripped.as_object_mut() {
        map.remove("record_hash");
    }
    sha256_hex(&canonical_json(&stripped))
}

// =============================================================================
// TESTS
// =============================================================================
