//! Session records: the unit of work moving through the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CoolingTier, FloorId, FloorScore, Lane, ReasonCode, Stakes, Verdict};

/// The five logical pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Reason,
    Evaluate,
    Decide,
    Seal,
}

impl Stage {
    /// The stage that must already appear in `stage_results` before this one
    pub fn required_prior(&self) -> Option<Stage> {
        match self {
            Stage::Init => None,
            Stage::Reason => Some(Stage::Init),
            Stage::Evaluate => Some(Stage::Reason),
            Stage::Decide => Some(Stage::Evaluate),
            Stage::Seal => Some(Stage::Decide),
        }
    }

    /// MCP tool name bound to this stage (part of the external contract)
    pub fn tool_name(&self) -> &'static str {
        match self {
            Stage::Init => "init_000",
            Stage::Reason => "agi_genius",
            Stage::Evaluate => "asi_act",
            Stage::Decide => "apex_judge",
            Stage::Seal => "vault_999",
        }
    }

    /// Floors scored by this stage. Later stages read, never overwrite.
    pub fn owned_floors(&self) -> &'static [FloorId] {
        match self {
            Stage::Init => &[],
            Stage::Reason => &[
                FloorId::F2,
                FloorId::F4,
                FloorId::F7,
                FloorId::F10,
                FloorId::F12,
                FloorId::F13,
            ],
            Stage::Evaluate => &[
                FloorId::F1,
                FloorId::F3,
                FloorId::F5,
                FloorId::F6,
                FloorId::F9,
                FloorId::F11,
            ],
            Stage::Decide => &[FloorId::F8],
            Stage::Seal => &[],
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Reason => "reason",
            Stage::Evaluate => "evaluate",
            Stage::Decide => "decide",
            Stage::Seal => "seal",
        };
        write!(f, "{}", name)
    }
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Open,
    Sealed,
    Orphaned,
}

/// Caller authority, derived from the presented authority token.
/// Ordering matters: GUEST < AUTHORIZED < SOVEREIGN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorityTier {
    Guest,
    Authorized,
    Sovereign,
}

impl std::fmt::Display for AuthorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthorityTier::Guest => "GUEST",
            AuthorityTier::Authorized => "AUTHORIZED",
            AuthorityTier::Sovereign => "SOVEREIGN",
        };
        write!(f, "{}", name)
    }
}

/// Structured result appended per completed stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub recorded_at: DateTime<Utc>,
    pub summary: String,
}

impl StageResult {
    pub fn now(stage: Stage, summary: impl Into<String>) -> Self {
        Self {
            stage,
            recorded_at: Utc::now(),
            summary: summary.into(),
        }
    }
}

/// Full session record held by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    /// Bearer secret; never echoed after init
    pub token: String,
    pub authority: AuthorityTier,
    pub opened_at: DateTime<Utc>,
    pub last_touched_at: DateTime<Utc>,
    /// Process that opened the session, for orphan detection
    pub process_id: u32,
    pub query: String,
    pub draft: Option<String>,
    /// Parties named at the evaluate stage as affected by the answer
    #[serde(default)]
    pub stakeholders: Vec<String>,
    pub lane: Lane,
    pub stakes: Stakes,
    pub stage_results: Vec<StageResult>,
    pub floor_scores: BTreeMap<FloorId, FloorScore>,
    pub status: SessionStatus,
    pub verdict: Option<Verdict>,
    pub verdict_reason: Option<ReasonCode>,
    pub cooling_tier: Option<CoolingTier>,
    pub p_truth: Option<f64>,
    pub merkle_root: Option<String>,
    pub ledger_hash: Option<String>,
}

impl SessionRecord {
    /// Has this stage already been recorded?
    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stage_results.iter().any(|r| r.stage == stage)
    }

    /// Stage-order gate: true when `stage` may run now
    pub fn may_run(&self, stage: Stage) -> bool {
        if self.has_stage(stage) && stage != Stage::Seal {
            return false;
        }
        match stage.required_prior() {
            None => true,
            Some(prior) => self.has_stage(prior),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
