//! Arbiter-0: constitutional governance filter
//!
//! A verdict pipeline placed in front of an arbitrary LLM or agent.
//! Every request flows through five tools (init -> reason -> evaluate ->
//! decide -> seal) and ends as one of four verdicts with a hash-chained,
//! Merkle-sealed audit record.

pub mod core;
pub mod types;

// =============================================================================
// FLOOR THRESHOLDS [C] - fixed at compile time
// =============================================================================

/// F2 truth threshold for the FACTUAL (hard) lane
pub const TRUTH_THRESHOLD_HARD: f64 = 0.99;

/// F2 truth threshold for all other lanes
pub const TRUTH_THRESHOLD_SOFT: f64 = 0.90;

/// F3 tri-witness threshold (enforced only at HIGH stakes)
pub const TRI_WITNESS_THRESHOLD: f64 = 0.95;

/// F5 Peace-squared floor
pub const PEACE_THRESHOLD: f64 = 1.0;

/// F6 empathy conductance floor
pub const EMPATHY_THRESHOLD: f64 = 0.95;

/// F7 humility band: value must land inside [low, high]
pub const HUMILITY_BAND_LOW: f64 = 0.03;
pub const HUMILITY_BAND_HIGH: f64 = 0.05;

/// F8 genius threshold (advisory; gates the L5 cooling tier at 0.85)
pub const GENIUS_THRESHOLD: f64 = 0.80;
pub const GENIUS_L5_THRESHOLD: f64 = 0.85;

/// F9 anti-hantu ceiling
pub const ANTI_HANTU_LIMIT: f64 = 0.30;

/// F12 injection risk limit: risk >= limit fails
pub const INJECTION_RISK_LIMIT: f64 = 0.85;

/// F13 curiosity floor
pub const CURIOSITY_THRESHOLD: f64 = 0.85;

// =============================================================================
// VERDICT RESOLUTION [C]
// =============================================================================

/// Alpha constant in the p_truth exponent
pub const P_TRUTH_ALPHA: f64 = 25.0;

/// Minimum p_truth for APPROVE
pub const P_TRUTH_MIN: f64 = 0.99;

// =============================================================================
// SESSIONS & LEDGER [C]
// =============================================================================

/// Default orphan cutoff in minutes (SESSION_TTL_MINUTES)
pub const DEFAULT_SESSION_TTL_MINUTES: u64 = 30;

/// Default per-caller per-tool bucket size (RATE_LIMIT_PER_MINUTE)
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Minimum interval between orphan sweeps, in seconds
pub const ORPHAN_SWEEP_INTERVAL_SECS: u64 = 300;

/// prev_hash of the genesis ledger entry
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
