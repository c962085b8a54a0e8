//! Verdict resolver: floor-score bundle + lane + stakes -> verdict
//!
//! Rule order:
//! 1. Any HARD floor failed        -> REJECT (L2)
//! 2. HIGH stakes, F3 not passed   -> ESCALATE (L2)
//! 3. p_truth below 0.99           -> REJECT (L3)
//! 4. Any SOFT floor failed        -> CONDITIONAL (L4)
//! 5. CRISIS without authority     -> ESCALATE (L2)
//! 6. APPROVE (L5 when F8 >= 0.85, else L4)

use std::collections::BTreeMap;

use crate::types::{
    AuthorityTier, CoolingTier, FloorId, FloorKind, FloorScore, Lane, ReasonCode, Stakes, Verdict,
};
use crate::{GENIUS_L5_THRESHOLD, P_TRUTH_ALPHA, P_TRUTH_MIN};

/// Resolver output: the verdict plus everything persisted with it
#[derive(Debug, Clone)]
pub struct Resolution {
    pub verdict: Verdict,
    pub reason: ReasonCode,
    /// One-line human summary naming the deciding rule
    pub summary: String,
    pub cooling_tier: CoolingTier,
    pub p_truth: f64,
}

/// Derived truth probability: 1 - exp(-alpha * ev * max(0, -dS) * TW),
/// clamped to [0, 1]. High truth requires both non-increasing entropy and
/// witness agreement.
pub fn p_truth(delta_s: f64, tri_witness: f64, evidence_ratio: f64) -> f64 {
    let gain = (-delta_s).max(0.0);
    let x = (P_TRUTH_ALPHA * evidence_ratio * gain * tri_witness).max(0.0);
    (1.0 - (-x.max(1e-9)).exp()).clamp(0.0, 1.0)
}

/// Resolve the full floor mapping into a verdict
pub fn resolve(
    floors: &BTreeMap<FloorId, FloorScore>,
    lane: Lane,
    stakes: Stakes,
    authority: AuthorityTier,
    evidence_ratio: f64,
) -> Resolution {
    // Rule 1: HARD floor dominance
    let hard_failures: Vec<&FloorScore> = floors
        .values()
        .filter(|s| s.kind == FloorKind::Hard && !s.passed)
        .collect();
    if !hard_failures.is_empty() {
        let names: Vec<&str> = hard_failures.iter().map(|s| s.floor.label()).collect();
        return Resolution {
            verdict: Verdict::Reject,
            reason: ReasonCode::HardFloorFailed,
            summary: format!("hard floors failed: {}", names.join(", ")),
            cooling_tier: CoolingTier::L2,
            p_truth: 0.0,
        };
    }

    // Rule 2: tri-witness under HIGH stakes
    let tw = floors.get(&FloorId::F3);
    if stakes == Stakes::High && !tw.map(|s| s.passed).unwrap_or(false) {
        return Resolution {
            verdict: Verdict::Escalate,
            reason: ReasonCode::TriWitnessRequired,
            summary: "high stakes without tri-witness agreement".to_string(),
            cooling_tier: CoolingTier::L2,
            p_truth: 0.0,
        };
    }

    // Rule 3: the p_truth gate
    let delta_s = floors.get(&FloorId::F4).map(|s| s.value).unwrap_or(0.0);
    let tw_value = tw.map(|s| s.value).unwrap_or(0.95);
    let p = p_truth(delta_s, tw_value, evidence_ratio);
    if p < P_TRUTH_MIN {
        return Resolution {
            verdict: Verdict::Reject,
            reason: ReasonCode::LowPTruth,
            summary: format!("low p_truth {:.3} < {:.2}", p, P_TRUTH_MIN),
            cooling_tier: CoolingTier::L3,
            p_truth: p,
        };
    }

    // Rule 4: SOFT floor failures
    let soft_failures: Vec<&FloorScore> = floors
        .values()
        .filter(|s| s.kind == FloorKind::Soft && !s.passed)
        .collect();
    if !soft_failures.is_empty() {
        let names: Vec<&str> = soft_failures.iter().map(|s| s.floor.label()).collect();
        return Resolution {
            verdict: Verdict::Conditional,
            reason: ReasonCode::SoftFloorFailed,
            summary: format!("soft floors failed: {}", names.join(", ")),
            cooling_tier: CoolingTier::L4,
            p_truth: p,
        };
    }

    // Rule 5: crisis lane needs an authorized caller
    if lane == Lane::Crisis && authority < AuthorityTier::Authorized {
        return Resolution {
            verdict: Verdict::Escalate,
            reason: ReasonCode::CrisisUnauthorized,
            summary: "crisis lane requires an authorized caller".to_string(),
            cooling_tier: CoolingTier::L2,
            p_truth: p,
        };
    }

    // Rule 6: approve
    let genius = floors.get(&FloorId::F8).map(|s| s.value).unwrap_or(0.0);
    let tier = if genius >= GENIUS_L5_THRESHOLD {
        CoolingTier::L5
    } else {
        CoolingTier::L4
    };
    Resolution {
        verdict: Verdict::Approve,
        reason: ReasonCode::Approved,
        summary: "all constitutional floors passed".to_string(),
        cooling_tier: tier,
        p_truth: p,
    }
}

// =============================================================================
// TESTS
// =============================================================================
