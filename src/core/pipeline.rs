//! Pipeline orchestrator: the five tools and the recovery sweeper
//!
//! - init_000   opens a session, classifies lane and stakes
//! - agi_genius (reason) scores F2, F4, F7, F10, F12, F13
//! - asi_act    (evaluate) scores F1, F3, F5, F6, F9, F11
//! - apex_judge (decide) scores F8 and resolves the verdict
//! - vault_999  (seal) writes the Merkle-sealed ledger entry
//!
//! Every failure mode is reduced to a verdict payload; transports never
//! see an exception. Stage order is enforced per session, and a seal is
//! idempotent: re-sealing returns the stored root without a second
//! ledger entry.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio::sync::Mutex;

use super::config::Config;
use super::floors::{EvalContext, FloorEvaluators};
use super::lane::LaneClassifier;
use super::ledger::{Ledger, LedgerError};
use super::merkle::{sha256_hex, SealLeaves};
use super::metrics::{Metrics, MetricsSnapshot};
use super::ratelimit::{classify_authority, RateLimiter};
use super::store::{LoggingKv, SessionStore, StoreError};
use super::verdict::resolve;
use crate::types::{
    AuthorityTier, CoolingTier, FloorId, FloorKind, FloorScore, Lane, LedgerEntry, ReasonCode,
    SessionRecord, SessionStatus, Stage, StageResult, Stakes, Verdict,
};
use crate::ORPHAN_SWEEP_INTERVAL_SECS;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Verdict-shaped refusal returned for every non-fatal failure
#[derive(Debug, Clone, Serialize)]
pub struct Refusal {
    pub verdict: Verdict,
    pub reason: ReasonCode,
    pub detail: String,
    pub cooling_tier: CoolingTier,
}

impl Refusal {
    pub fn reject(reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Reject,
            reason,
            detail: detail.into(),
            cooling_tier: CoolingTier::L0,
        }
    }

    pub fn escalate(reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Escalate,
            reason,
            detail: detail.into(),
            cooling_tier: CoolingTier::L2,
        }
    }
}

impl From<StoreError> for Refusal {
    fn from(e: StoreError) -> Self {
        let reason = match e {
            StoreError::NotFound => ReasonCode::SessionNotFound,
            StoreError::Unauthorized => ReasonCode::Unauthorized,
            StoreError::Terminal => ReasonCode::SessionSealed,
            StoreError::StageOrder(_) => ReasonCode::OutOfOrder,
            StoreError::FloorOverwrite => ReasonCode::OutOfOrder,
        };
        Refusal::reject(reason, e.to_string())
    }
}

pub type ToolResult<T> = Result<T, Refusal>;

#[derive(Debug, Clone, Deserialize)]
pub struct InitRequest {
    pub query: String,
    #[serde(default)]
    pub authority_token: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitResponse {
    pub session_id: String,
    /// Echoed exactly once, here
    pub session_token: String,
    pub lane: Lane,
    pub stakes: Stakes,
    pub authority: AuthorityTier,
    pub status: SessionStatus,
}

/// Shared request shape for the reason and evaluate stages
#[derive(Debug, Clone, Deserialize)]
pub struct StageRequest {
    pub session_id: String,
    pub session_token: String,
    /// Candidate answer under review. The reason tool names this field
    /// `draft`, the evaluate tool names it `text`; both feed the same slot.
    #[serde(default, alias = "text")]
    pub draft: Option<String>,
    /// Parties affected by the answer, named at the evaluate stage
    #[serde(default)]
    pub stakeholders: Vec<String>,
    #[serde(default)]
    pub evidence_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageResponse {
    pub session_id: String,
    pub stage: Stage,
    pub floors: Vec<FloorScore>,
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecideRequest {
    pub session_id: String,
    pub session_token: String,
    #[serde(default)]
    pub evidence_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecideResponse {
    pub session_id: String,
    pub verdict: Verdict,
    pub reason: ReasonCode,
    pub summary: String,
    pub cooling_tier: CoolingTier,
    pub p_truth: f64,
    pub floors: BTreeMap<FloorId, FloorScore>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SealRequest {
    pub session_id: String,
    pub session_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SealResponse {
    pub session_id: String,
    pub verdict: Verdict,
    pub merkle_root: String,
    pub ledger_hash: String,
    pub sealed_at: DateTime<Utc>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposeRequest {
    pub proposal: String,
    #[serde(default)]
    pub authority_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposeResponse {
    pub verdict: Verdict,
    pub reason: ReasonCode,
    pub proposal_id: String,
    pub summary: String,
}

/// Full-pipeline outcome returned by the one-shot checkpoint path
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointOutcome {
    pub session_id: String,
    pub verdict: Verdict,
    pub reason: ReasonCode,
    pub summary: String,
    pub cooling_tier: CoolingTier,
    pub p_truth: f64,
    pub lane: Lane,
    pub stakes: Stakes,
    pub floors: BTreeMap<FloorId, FloorScore>,
    pub merkle_root: String,
    pub ledger_hash: String,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

pub struct Pipeline {
    config: Config,
    store: SessionStore,
    evaluators: FloorEvaluators,
    classifier: LaneClassifier,
    ledger: Ledger,
    limiter: RateLimiter,
    metrics: Metrics,
    /// Serializes seal commits so an idempotent re-seal never double-writes
    seal_lock: Mutex<()>,
    last_sweep: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, LedgerError> {
        let ledger = match &config.ledger_path {
            Some(path) => Ledger::open(path)?,
            None => Ledger::in_memory(),
        };
        let store = match &config.external_kv_url {
            Some(url) => SessionStore::with_external(Box::new(LoggingKv::new(url.clone()))),
            None => SessionStore::new(),
        };
        let limiter = RateLimiter::new(config.rate_limit_per_minute);
        Ok(Self {
            config,
            store,
            evaluators: FloorEvaluators::new(),
            classifier: LaneClassifier::new(),
            ledger,
            limiter,
            metrics: Metrics::new(),
            seal_lock: Mutex::new(()),
            last_sweep: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.store.active_count().await).await
    }

    /// Rate-limit gate shared by all transports
    pub async fn check_rate(&self, caller: &str, tool: &str) -> ToolResult<()> {
        if self.limiter.try_acquire(caller, tool).await {
            Ok(())
        } else {
            Err(Refusal::reject(
                ReasonCode::RateLimit,
                format!("bucket for {} exhausted", tool),
            ))
        }
    }

    // =========================================================================
    // THE FIVE TOOLS
    // =========================================================================

    /// init_000: open a session and classify the query
    pub async fn init(&self, req: InitRequest) -> ToolResult<InitResponse> {
        let query = req.query.trim().to_string();
        if query.is_empty() {
            return Err(Refusal::reject(ReasonCode::BadInput, "query is empty"));
        }
        if let Some(id) = &req.session_id {
            if self.store.get(id).await.is_some() {
                return Err(Refusal::reject(
                    ReasonCode::BadInput,
                    "session id already in use",
                ));
            }
        }

        let authority = self.authority(req.authority_token.as_deref());
        let lane = self.classifier.classify(&query);
        let stakes = self.classifier.stakes(lane, &query);

        let (session_id, token) = self
            .store
            .open(
                authority,
                &query,
                lane,
                stakes,
                std::process::id(),
                req.session_id,
            )
            .await;
        self.store
            .attach_stage(
                &session_id,
                &token,
                StageResult::now(Stage::Init, format!("lane {} stakes {}", lane, stakes)),
            )
            .await?;

        tracing::info!(session = %session_id, %lane, %stakes, %authority, "session opened");
        Ok(InitResponse {
            session_id,
            session_token: token,
            lane,
            stakes,
            authority,
            status: SessionStatus::Open,
        })
    }

    /// agi_genius: reason-stage floors over the query and draft
    pub async fn reason(&self, req: StageRequest) -> ToolResult<StageResponse> {
        let mut record = self.store.touch(&req.session_id, &req.session_token).await?;
        if !record.may_run(Stage::Reason) {
            return Err(out_of_order(Stage::Reason));
        }
        if let Some(draft) = &req.draft {
            self.store
                .attach_draft(&req.session_id, &req.session_token, draft)
                .await?;
            record.draft = Some(draft.clone());
        }
        self.run_stage(&record, Stage::Reason, &req.session_token, req.evidence_ratio)
            .await
    }

    /// asi_act: evaluate-stage floors over the text under review
    pub async fn evaluate(&self, req: StageRequest) -> ToolResult<StageResponse> {
        let mut record = self.store.touch(&req.session_id, &req.session_token).await?;
        if !record.may_run(Stage::Evaluate) {
            return Err(out_of_order(Stage::Evaluate));
        }
        if let Some(text) = &req.draft {
            self.store
                .attach_draft(&req.session_id, &req.session_token, text)
                .await?;
            record.draft = Some(text.clone());
        }
        if !req.stakeholders.is_empty() {
            self.store
                .attach_stakeholders(&req.session_id, &req.session_token, &req.stakeholders)
                .await?;
        }
        self.run_stage(&record, Stage::Evaluate, &req.session_token, req.evidence_ratio)
            .await
    }

    /// apex_judge: score F8 and resolve the verdict
    pub async fn decide(&self, req: DecideRequest) -> ToolResult<DecideResponse> {
        let mut record = self.store.touch(&req.session_id, &req.session_token).await?;
        if !record.may_run(Stage::Decide) {
            return Err(out_of_order(Stage::Decide));
        }
        let ev = req.evidence_ratio.unwrap_or(1.0);

        let floors = self.score_stage(&record, Stage::Decide, ev);
        self.store
            .attach_stage(
                &req.session_id,
                &req.session_token,
                StageResult::now(Stage::Decide, stage_summary(&floors)),
            )
            .await?;
        self.store
            .attach_floors(&req.session_id, &req.session_token, floors.clone())
            .await?;
        for score in &floors {
            self.metrics.record_floor(score.floor, score.passed).await;
            record.floor_scores.insert(score.floor, score.clone());
        }

        let resolution = resolve(
            &record.floor_scores,
            record.lane,
            record.stakes,
            record.authority,
            ev,
        );
        self.store
            .attach_decision(
                &req.session_id,
                &req.session_token,
                resolution.verdict,
                resolution.reason,
                resolution.cooling_tier,
                resolution.p_truth,
            )
            .await?;
        self.metrics.record_verdict(resolution.verdict).await;
        tracing::info!(session = %req.session_id, verdict = %resolution.verdict,
            reason = %resolution.reason.code(), "verdict resolved");

        Ok(DecideResponse {
            session_id: req.session_id,
            verdict: resolution.verdict,
            reason: resolution.reason,
            summary: resolution.summary,
            cooling_tier: resolution.cooling_tier,
            p_truth: resolution.p_truth,
            floors: record.floor_scores,
        })
    }

    /// vault_999: seal the session into the ledger. Idempotent on a
    /// sealed session; a failed append leaves the session OPEN.
    pub async fn seal(&self, req: SealRequest) -> ToolResult<SealResponse> {
        let _guard = self.seal_lock.lock().await;

        let record = self
            .store
            .get(&req.session_id)
            .await
            .ok_or_else(|| Refusal::reject(ReasonCode::SessionNotFound, "no such session"))?;
        if record.token != req.session_token {
            return Err(Refusal::reject(ReasonCode::Unauthorized, "token mismatch"));
        }

        if record.status == SessionStatus::Sealed {
            // Idempotent re-seal: same artifacts, no new ledger entry
            return Ok(SealResponse {
                session_id: record.session_id,
                verdict: record.verdict.unwrap_or(Verdict::Reject),
                merkle_root: record.merkle_root.unwrap_or_default(),
                ledger_hash: record.ledger_hash.unwrap_or_default(),
                sealed_at: record.last_touched_at,
                status: SessionStatus::Sealed,
            });
        }
        if !record.may_run(Stage::Seal) {
            return Err(out_of_order(Stage::Seal));
        }
        let (verdict, reason, tier) = match (record.verdict, record.verdict_reason, record.cooling_tier)
        {
            (Some(v), Some(r), Some(t)) => (v, r, t),
            _ => return Err(out_of_order(Stage::Seal)),
        };

        let now = Utc::now();
        let leaves = SealLeaves {
            session_id: record.session_id.clone(),
            verdict: verdict.to_string(),
            query: record.query.clone(),
            timestamp_secs: now.timestamp(),
        };
        let entry = LedgerEntry {
            session_id: record.session_id.clone(),
            timestamp_ms: now.timestamp_millis(),
            sealed_at: now,
            lane: record.lane,
            stakes: record.stakes,
            floor_scores: record.floor_scores.clone(),
            verdict,
            verdict_reason: reason,
            cooling_tier: tier,
            prev_hash: String::new(),
            merkle_root: leaves.root(),
            record_hash: String::new(),
        };

        let sealed = match self.ledger.append(entry).await {
            Ok(sealed) => sealed,
            Err(e) => {
                tracing::warn!(session = %record.session_id, error = %e,
                    "seal aborted; session left open");
                return Err(Refusal::escalate(ReasonCode::SealFailed, e.to_string()));
            }
        };

        self.store
            .attach_stage(
                &req.session_id,
                &req.session_token,
                StageResult::now(Stage::Seal, format!("merkle root {}", sealed.merkle_root)),
            )
            .await?;
        self.store
            .close(
                &req.session_id,
                &req.session_token,
                &sealed.merkle_root,
                &sealed.record_hash,
            )
            .await?;

        Ok(SealResponse {
            session_id: req.session_id,
            verdict,
            merkle_root: sealed.merkle_root,
            ledger_hash: sealed.record_hash,
            sealed_at: now,
            status: SessionStatus::Sealed,
        })
    }

    /// Sovereign governance proposal: recorded and escalated, never applied
    pub async fn propose(&self, req: ProposeRequest) -> ToolResult<ProposeResponse> {
        let authority = self.authority(req.authority_token.as_deref());
        if authority < AuthorityTier::Sovereign {
            return Err(Refusal::reject(
                ReasonCode::AuthorityTooLow,
                format!("proposals require SOVEREIGN, caller is {}", authority),
            ));
        }
        let proposal = req.proposal.trim();
        if proposal.is_empty() {
            return Err(Refusal::reject(ReasonCode::BadInput, "proposal is empty"));
        }
        let proposal_id = sha256_hex(&format!("proposal:{}", proposal))[..16].to_string();
        tracing::info!(%proposal_id, "governance proposal recorded for human review");
        Ok(ProposeResponse {
            verdict: Verdict::Escalate,
            reason: ReasonCode::ProposalRecorded,
            proposal_id,
            summary: "proposal escalated for human review; nothing auto-applied".to_string(),
        })
    }

    // =========================================================================
    // ONE-SHOT CHECKPOINT
    // =========================================================================

    /// Full pipeline in one call. The reason and evaluate heuristic banks
    /// run concurrently; their floors attach in stage order afterwards.
    pub async fn checkpoint(
        &self,
        query: &str,
        draft: Option<&str>,
        evidence_ratio: Option<f64>,
        authority_token: Option<&str>,
    ) -> ToolResult<CheckpointOutcome> {
        let started = Instant::now();
        let ev = evidence_ratio.unwrap_or(1.0);
        let opened = self
            .init(InitRequest {
                query: query.to_string(),
                authority_token: authority_token.map(String::from),
                session_id: None,
            })
            .await?;
        let (id, token) = (opened.session_id, opened.session_token);

        if let Some(draft) = draft {
            self.store.attach_draft(&id, &token, draft).await?;
        }
        let record = self
            .store
            .get(&id)
            .await
            .ok_or_else(|| Refusal::reject(ReasonCode::SessionNotFound, "session vanished"))?;

        let (reason_floors, evaluate_floors) = tokio::join!(
            async { self.score_stage(&record, Stage::Reason, ev) },
            async { self.score_stage(&record, Stage::Evaluate, ev) },
        );
        for (stage, floors) in [
            (Stage::Reason, reason_floors),
            (Stage::Evaluate, evaluate_floors),
        ] {
            self.store
                .attach_stage(&id, &token, StageResult::now(stage, stage_summary(&floors)))
                .await?;
            for score in &floors {
                self.metrics.record_floor(score.floor, score.passed).await;
            }
            self.store.attach_floors(&id, &token, floors).await?;
        }

        let decided = self
            .decide(DecideRequest {
                session_id: id.clone(),
                session_token: token.clone(),
                evidence_ratio,
            })
            .await?;
        let sealed = self
            .seal(SealRequest {
                session_id: id.clone(),
                session_token: token,
            })
            .await?;
        self.metrics
            .record_tool("checkpoint", started.elapsed().as_secs_f64() * 1000.0)
            .await;

        Ok(CheckpointOutcome {
            session_id: id,
            verdict: decided.verdict,
            reason: decided.reason,
            summary: decided.summary,
            cooling_tier: decided.cooling_tier,
            p_truth: decided.p_truth,
            lane: opened.lane,
            stakes: opened.stakes,
            floors: decided.floors,
            merkle_root: sealed.merkle_root,
            ledger_hash: sealed.ledger_hash,
        })
    }

    // =========================================================================
    // ORPHAN RECOVERY
    // =========================================================================

    /// Background recovery task for the long-lived transports (HTTP and
    /// MCP stdio). Ticks once a minute; `sweep_orphans` enforces the
    /// shared per-interval limit.
    pub fn spawn_sweeper(pipeline: std::sync::Arc<Pipeline>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                tick.tick().await;
                pipeline.sweep_orphans().await;
            }
        })
    }

    /// Shared-limit sweep entry point: at most one sweep per interval,
    /// whoever the caller is
    pub async fn sweep_orphans(&self) -> usize {
        {
            let mut last = self.last_sweep.lock().await;
            if let Some(at) = *last {
                if at.elapsed().as_secs() < ORPHAN_SWEEP_INTERVAL_SECS {
                    return 0;
                }
            }
            *last = Some(Instant::now());
        }
        self.sweep_now().await
    }

    /// Unthrottled sweep: seal every expired or process-dead session with
    /// REJECT / orphan_recovered
    pub async fn sweep_now(&self) -> usize {
        let orphans = self
            .store
            .list_orphans(self.config.session_ttl_minutes)
            .await;
        let mut recovered = 0;
        for record in orphans {
            self.store.mark_orphaned(&record.session_id).await;
            let now = Utc::now();
            let leaves = SealLeaves {
                session_id: record.session_id.clone(),
                verdict: Verdict::Reject.to_string(),
                query: record.query.clone(),
                timestamp_secs: now.timestamp(),
            };
            let entry = LedgerEntry {
                session_id: record.session_id.clone(),
                timestamp_ms: now.timestamp_millis(),
                sealed_at: now,
                lane: record.lane,
                stakes: record.stakes,
                floor_scores: record.floor_scores.clone(),
                verdict: Verdict::Reject,
                verdict_reason: ReasonCode::OrphanRecovered,
                cooling_tier: CoolingTier::L2,
                prev_hash: String::new(),
                merkle_root: leaves.root(),
                record_hash: String::new(),
            };
            match self.ledger.append(entry).await {
                Ok(sealed) => {
                    if let Err(e) = self
                        .store
                        .close_orphan(&record.session_id, &sealed.merkle_root, &sealed.record_hash)
                        .await
                    {
                        tracing::warn!(session = %record.session_id, error = %e,
                            "orphan sealed in ledger but not in store");
                    }
                    self.metrics.record_verdict(Verdict::Reject).await;
                    tracing::info!(session = %record.session_id, "orphan session recovered");
                    recovered += 1;
                }
                Err(e) => {
                    tracing::warn!(session = %record.session_id, error = %e,
                        "orphan seal failed; will retry next sweep");
                }
            }
        }
        recovered
    }

    // =========================================================================
    // GENERIC DISPATCH (MCP and CLI)
    // =========================================================================

    /// Dispatch a named tool call with JSON arguments. Always returns a
    /// JSON body; refusals serialize as verdict payloads.
    pub async fn dispatch(&self, caller: &str, tool: &str, args: Value) -> Value {
        let started = Instant::now();
        let reply = self.dispatch_inner(caller, tool, args).await;
        self.metrics
            .record_tool(tool, started.elapsed().as_secs_f64() * 1000.0)
            .await;
        match reply {
            Ok(body) => body,
            Err(refusal) => to_json(&refusal),
        }
    }

    async fn dispatch_inner(&self, caller: &str, tool: &str, args: Value) -> ToolResult<Value> {
        self.check_rate(caller, tool).await?;
        match tool {
            "init_000" => Ok(to_json(&self.init(parse(args)?).await?)),
            "agi_genius" => Ok(to_json(&self.reason(parse(args)?).await?)),
            "asi_act" => Ok(to_json(&self.evaluate(parse(args)?).await?)),
            "apex_judge" => Ok(to_json(&self.decide(parse(args)?).await?)),
            "vault_999" => {
                if args.get("action").and_then(Value::as_str) == Some("propose") {
                    Ok(to_json(&self.propose(parse(args)?).await?))
                } else {
                    Ok(to_json(&self.seal(parse(args)?).await?))
                }
            }
            other => Err(Refusal::reject(
                ReasonCode::BadInput,
                format!("unknown tool {}", other),
            )),
        }
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn authority(&self, token: Option<&str>) -> AuthorityTier {
        classify_authority(token, self.config.api_key.as_deref())
    }

    /// Score one stage's floors. Derived floors run last so they see the
    /// sibling scores from the same stage.
    fn score_stage(&self, record: &SessionRecord, stage: Stage, evidence_ratio: f64) -> Vec<FloorScore> {
        let mut ctx = EvalContext::new(record.lane, record.stakes, record.authority);
        ctx.evidence_ratio = evidence_ratio;
        ctx.prior = record.floor_scores.clone();

        let mut order: Vec<FloorId> = stage.owned_floors().to_vec();
        order.sort_by_key(|f| f.kind() == FloorKind::Derived);

        let mut out = Vec::with_capacity(order.len());
        for floor in order {
            let score = self
                .evaluators
                .evaluate(floor, &record.query, record.draft.as_deref(), &ctx);
            ctx.prior.insert(floor, score.clone());
            out.push(score);
        }
        out
    }

    async fn run_stage(
        &self,
        record: &SessionRecord,
        stage: Stage,
        token: &str,
        evidence_ratio: Option<f64>,
    ) -> ToolResult<StageResponse> {
        let floors = self.score_stage(record, stage, evidence_ratio.unwrap_or(1.0));
        self.store
            .attach_stage(
                &record.session_id,
                token,
                StageResult::now(stage, stage_summary(&floors)),
            )
            .await?;
        self.store
            .attach_floors(&record.session_id, token, floors.clone())
            .await?;
        for score in &floors {
            self.metrics.record_floor(score.floor, score.passed).await;
        }
        Ok(StageResponse {
            session_id: record.session_id.clone(),
            stage,
            summary: stage_summary(&floors),
            floors,
        })
    }
}

fn out_of_order(stage: Stage) -> Refusal {
    Refusal::reject(
        ReasonCode::OutOfOrder,
        format!("stage {} may not run now", stage),
    )
}

fn stage_summary(floors: &[FloorScore]) -> String {
    let failed: Vec<&str> = floors
        .iter()
        .filter(|s| !s.passed)
        .map(|s| s.floor.label())
        .collect();
    if failed.is_empty() {
        format!("{} floors passed", floors.len())
    } else {
        format!("failed: {}", failed.join(", "))
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args).map_err(|e| Refusal::reject(ReasonCode::BadInput, e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| json!({"verdict": "REJECT"}))
}

// =============================================================================
// TESTS
// =============================================================================
