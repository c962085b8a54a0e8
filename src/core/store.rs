//! Session store: in-process map of session records with token auth,
//! TTL-based orphan detection, and best-effort external write-through
//!
//! The external KV is an availability-degradable collaborator: a failing
//! external store is logged and the system continues in-process only.

use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{
    AuthorityTier, FloorScore, Lane, SessionRecord, SessionStatus, Stage, StageResult, Stakes,
};

/// Store-level failures. These never leak to callers as transport errors;
/// the orchestrator reduces each to a verdict.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("session not found")]
    NotFound,
    #[error("session token mismatch")]
    Unauthorized,
    #[error("session already sealed")]
    Terminal,
    #[error("stage {0} out of order")]
    StageOrder(Stage),
    #[error("floor already scored in an earlier stage")]
    FloorOverwrite,
}

/// Optional persistent backend. Writes are best-effort; reads always
/// prefer the in-process cache.
pub trait ExternalKv: Send + Sync {
    fn put(&self, key: &str, value: &str) -> Result<(), String>;
}

/// Session store backed by an in-process map, optionally write-through
/// to an external KV
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    external: Option<Box<dyn ExternalKv>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("external", &self.external.is_some())
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            external: None,
        }
    }

    pub fn with_external(external: Box<dyn ExternalKv>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            external: Some(external),
        }
    }

    /// Open a session; returns (session_id, token). The token is an opaque
    /// 128-bit bearer secret, hex-encoded.
    pub async fn open(
        &self,
        authority: AuthorityTier,
        query: &str,
        lane: Lane,
        stakes: Stakes,
        process_id: u32,
        session_id: Option<String>,
    ) -> (String, String) {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let token = format!("{:032x}", Uuid::new_v4().as_u128());
        let now = Utc::now();

        let record = SessionRecord {
            session_id: session_id.clone(),
            token: token.clone(),
            authority,
            opened_at: now,
            last_touched_at: now,
            process_id,
            query: query.to_string(),
            draft: None,
            stakeholders: Vec::new(),
            lane,
            stakes,
            stage_results: Vec::new(),
            floor_scores: BTreeMap::new(),
            status: SessionStatus::Open,
            verdict: None,
            verdict_reason: None,
            cooling_tier: None,
            p_truth: None,
            merkle_root: None,
            ledger_hash: None,
        };

        self.write_through(&record);
        self.sessions.write().await.insert(session_id.clone(), record);
        (session_id, token)
    }

    /// Validate (session_id, token) and return a snapshot of the record
    pub async fn touch(&self, session_id: &str, token: &str) -> Result<SessionRecord, StoreError> {
        let sessions = self.sessions.read().await;
        let record = sessions.get(session_id).ok_or(StoreError::NotFound)?;
        if record.token != token {
            return Err(StoreError::Unauthorized);
        }
        if record.status == SessionStatus::Sealed {
            return Err(StoreError::Terminal);
        }
        Ok(record.clone())
    }

    /// Append a stage result, preserving pipeline order. The write lock
    /// serializes concurrent advances of the same session.
    pub async fn attach_stage(
        &self,
        session_id: &str,
        token: &str,
        result: StageResult,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;
        if record.token != token {
            return Err(StoreError::Unauthorized);
        }
        if record.status == SessionStatus::Sealed {
            return Err(StoreError::Terminal);
        }
        if !record.may_run(result.stage) {
            return Err(StoreError::StageOrder(result.stage));
        }
        record.stage_results.push(result);
        record.last_touched_at = Utc::now();
        self.write_through(record);
        Ok(())
    }

    /// Merge floor scores; a floor scored by an earlier stage is read-only
    pub async fn attach_floors(
        &self,
        session_id: &str,
        token: &str,
        scores: Vec<FloorScore>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;
        if record.token != token {
            return Err(StoreError::Unauthorized);
        }
        if record.status == SessionStatus::Sealed {
            return Err(StoreError::Terminal);
        }
        for score in &scores {
            if record.floor_scores.contains_key(&score.floor) {
                return Err(StoreError::FloorOverwrite);
            }
        }
        for score in scores {
            record.floor_scores.insert(score.floor, score);
        }
        record.last_touched_at = Utc::now();
        self.write_through(record);
        Ok(())
    }

    /// Record the draft text presented at the reason stage
    pub async fn attach_draft(
        &self,
        session_id: &str,
        token: &str,
        draft: &str,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;
        if record.token != token {
            return Err(StoreError::Unauthorized);
        }
        record.draft = Some(draft.to_string());
        Ok(())
    }

    /// Record the stakeholders named at the evaluate stage
    pub async fn attach_stakeholders(
        &self,
        session_id: &str,
        token: &str,
        stakeholders: &[String],
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;
        if record.token != token {
            return Err(StoreError::Unauthorized);
        }
        record.stakeholders = stakeholders.to_vec();
        Ok(())
    }

    /// Store the decide-stage outcome on the record
    pub async fn attach_decision(
        &self,
        session_id: &str,
        token: &str,
        verdict: crate::types::Verdict,
        reason: crate::types::ReasonCode,
        tier: crate::types::CoolingTier,
        p_truth: f64,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;
        if record.token != token {
            return Err(StoreError::Unauthorized);
        }
        record.verdict = Some(verdict);
        record.verdict_reason = Some(reason);
        record.cooling_tier = Some(tier);
        record.p_truth = Some(p_truth);
        record.last_touched_at = Utc::now();
        self.write_through(record);
        Ok(())
    }

    /// Transition OPEN -> SEALED with the seal artifacts
    pub async fn close(
        &self,
        session_id: &str,
        token: &str,
        merkle_root: &str,
        ledger_hash: &str,
    ) -> Result<SessionRecord, StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;
        if record.token != token {
            return Err(StoreError::Unauthorized);
        }
        record.status = SessionStatus::Sealed;
        record.merkle_root = Some(merkle_root.to_string());
        record.ledger_hash = Some(ledger_hash.to_string());
        record.last_touched_at = Utc::now();
        self.write_through(record);
        Ok(record.clone())
    }

    /// Sweeper path: seal an orphan without its token
    pub async fn close_orphan(
        &self,
        session_id: &str,
        merkle_root: &str,
        ledger_hash: &str,
    ) -> Result<SessionRecord, StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(session_id).ok_or(StoreError::NotFound)?;
        if record.status == SessionStatus::Sealed {
            return Err(StoreError::Terminal);
        }
        record.status = SessionStatus::Sealed;
        record.merkle_root = Some(merkle_root.to_string());
        record.ledger_hash = Some(ledger_hash.to_string());
        record.last_touched_at = Utc::now();
        self.write_through(record);
        Ok(record.clone())
    }

    /// Mark a session ORPHANED (still sweepable; not yet sealed)
    pub async fn mark_orphaned(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(record) = sessions.get_mut(session_id) {
            if record.status == SessionStatus::Open {
                record.status = SessionStatus::Orphaned;
            }
        }
    }

    /// OPEN sessions idle past the TTL, or whose owning process has exited
    pub async fn list_orphans(&self, ttl_minutes: u64) -> Vec<SessionRecord> {
        let cutoff = Utc::now() - ChronoDuration::minutes(ttl_minutes as i64);
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|r| r.status != SessionStatus::Sealed)
            .filter(|r| r.last_touched_at < cutoff || !process_alive(r.process_id))
            .cloned()
            .collect()
    }

    /// Read-only lookup without token (internal surfaces only)
    pub async fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Count of sessions not yet sealed
    pub async fn active_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|r| r.status != SessionStatus::Sealed)
            .count()
    }

    /// Best-effort external persistence; failure degrades to in-process only
    fn write_through(&self, record: &SessionRecord) {
        if let Some(external) = &self.external {
            let key = format!("session:{}", record.session_id);
            match serde_json::to_string(record) {
                Ok(value) => {
                    if let Err(e) = external.put(&key, &value) {
                        tracing::warn!(session = %record.session_id, error = %e,
                            "external session store unavailable; continuing in-process");
                    }
                }
                Err(e) => {
                    tracing::warn!(session = %record.session_id, error = %e,
                        "session record not serializable for external store");
                }
            }
        }
    }
}

/// Placeholder backend selected by EXTERNAL_KV_URL: records writes at
/// debug level. A networked KV client slots in behind the same trait.
pub struct LoggingKv {
    url: String,
}

impl LoggingKv {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl ExternalKv for LoggingKv {
    fn put(&self, key: &str, _value: &str) -> Result<(), String> {
        tracing::debug!(url = %self.url, key = %key, "external kv write");
        Ok(())
    }
}

/// Liveness probe for orphan detection. The current process is always
/// live; other pids are checked against /proc where available.
fn process_alive(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    std::path::Path::new(&format!("/proc/{}", pid)).exists()
}

// =============================================================================
// TESTS
// =============================================================================
