//! Reason codes for verdicts produced by policy and error paths
//!
//! Every non-fatal outcome is reduced to a verdict; these codes make the
//! reduction machine-readable.

use serde::{Deserialize, Serialize};

/// Machine-readable reason attached to a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    // =========================================================================
    // Resolution outcomes
    // =========================================================================
    /// All floors passed and p_truth cleared the gate
    Approved,
    /// A HARD floor failed
    HardFloorFailed,
    /// A SOFT floor failed (no HARD failure)
    SoftFloorFailed,
    /// Derived truth probability below the gate
    LowPTruth,
    /// HIGH stakes and F3 did not pass
    TriWitnessRequired,
    /// CRISIS lane with an unauthorized caller
    CrisisUnauthorized,

    // =========================================================================
    // Input / authorization errors
    // =========================================================================
    /// Stage called before its required prior stage
    OutOfOrder,
    /// Missing or malformed field
    BadInput,
    /// Missing or wrong session token
    Unauthorized,
    /// Unknown session id
    SessionNotFound,
    /// Session already sealed
    SessionSealed,
    /// Token bucket exhausted
    RateLimit,
    /// Caller's authority tier below the required tier
    AuthorityTooLow,

    // =========================================================================
    // Operational outcomes
    // =========================================================================
    /// Ledger append failed after retry; session stays OPEN
    SealFailed,
    /// Abandoned session sealed by the recovery sweeper
    OrphanRecovered,
    /// Sovereign governance proposal recorded, never auto-applied
    ProposalRecorded,
}

impl ReasonCode {
    /// Wire string (matches the serde rename)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::HardFloorFailed => "hard_floor_failed",
            Self::SoftFloorFailed => "soft_floor_failed",
            Self::LowPTruth => "low_p_truth",
            Self::TriWitnessRequired => "tri_witness_required",
            Self::CrisisUnauthorized => "crisis_unauthorized",
            Self::OutOfOrder => "out_of_order",
            Self::BadInput => "bad_input",
            Self::Unauthorized => "unauthorized",
            Self::SessionNotFound => "session_not_found",
            Self::SessionSealed => "session_sealed",
            Self::RateLimit => "rate_limit",
            Self::AuthorityTooLow => "authority_too_low",
            Self::SealFailed => "seal_failed",
            Self::OrphanRecovered => "orphan_recovered",
            Self::ProposalRecorded => "proposal_recorded",
        }
    }

    /// One-line human description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Approved => "All constitutional floors passed",
            Self::HardFloorFailed => "A hard floor was violated",
            Self::SoftFloorFailed => "A soft floor was violated",
            Self::LowPTruth => "Derived truth probability below 0.99",
            Self::TriWitnessRequired => "High stakes without tri-witness agreement",
            Self::CrisisUnauthorized => "Crisis lane requires an authorized caller",
            Self::OutOfOrder => "Pipeline stage called out of order",
            Self::BadInput => "Malformed or missing input field",
            Self::Unauthorized => "Session token missing or wrong",
            Self::SessionNotFound => "No such session",
            Self::SessionSealed => "Session already sealed",
            Self::RateLimit => "Rate limit exceeded",
            Self::AuthorityTooLow => "Caller authority below required tier",
            Self::SealFailed => "Ledger append failed; session left open",
            Self::OrphanRecovered => "Abandoned session recovered by sweeper",
            Self::ProposalRecorded => "Governance proposal awaiting review",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
