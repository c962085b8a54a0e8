//! Ledger entry: one appended line per sealed session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CoolingTier, FloorId, FloorScore, Lane, ReasonCode, Stakes, Verdict};

/// One sealed session, as written to the append-only ledger.
///
/// `record_hash` is SHA-256 over the canonical JSON of the entry with
/// `record_hash` itself excluded. `prev_hash` of entry N+1 equals
/// `record_hash` of entry N; genesis uses 64 zero hex chars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub session_id: String,
    pub timestamp_ms: i64,
    pub sealed_at: DateTime<Utc>,
    pub lane: Lane,
    pub stakes: Stakes,
    /// Full mapping, no omissions
    pub floor_scores: BTreeMap<FloorId, FloorScore>,
    pub verdict: Verdict,
    pub verdict_reason: ReasonCode,
    pub cooling_tier: CoolingTier,
    pub prev_hash: String,
    pub merkle_root: String,
    pub record_hash: String,
}
