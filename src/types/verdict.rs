//! Verdict and cooling-tier types

use serde::{Deserialize, Serialize};

/// The only four outcomes ever exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Approve,
    Conditional,
    Reject,
    Escalate,
}

impl Verdict {
    /// All verdicts, for metrics iteration
    pub const ALL: [Verdict; 4] = [
        Verdict::Approve,
        Verdict::Conditional,
        Verdict::Reject,
        Verdict::Escalate,
    ];

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            Verdict::Approve => "\x1b[32m",     // Green
            Verdict::Conditional => "\x1b[33m", // Yellow
            Verdict::Reject => "\x1b[31m",      // Red
            Verdict::Escalate => "\x1b[35m",    // Magenta
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Verdict::Approve => "APPROVE",
            Verdict::Conditional => "CONDITIONAL",
            Verdict::Reject => "REJECT",
            Verdict::Escalate => "ESCALATE",
        };
        write!(f, "{}", name)
    }
}

/// Advisory cooling tier attached to a verdict.
/// Tiers never bind the orchestrator; they are reported and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoolingTier {
    /// Immediate re-use allowed
    L0,
    /// Phoenix-72: wait 72 h before re-issuing the same query
    L2,
    /// Weekly
    L3,
    /// Monthly
    L4,
    /// Eternal (canonical acceptance)
    L5,
}

impl CoolingTier {
    /// Human-readable re-issue guidance
    pub fn description(&self) -> &'static str {
        match self {
            CoolingTier::L0 => "immediate re-use allowed",
            CoolingTier::L2 => "Phoenix-72: wait 72 hours",
            CoolingTier::L3 => "weekly",
            CoolingTier::L4 => "monthly",
            CoolingTier::L5 => "eternal - canonical acceptance",
        }
    }
}

impl std::fmt::Display for CoolingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CoolingTier::L0 => "L0",
            CoolingTier::L2 => "L2",
            CoolingTier::L3 => "L3",
            CoolingTier::L4 => "L4",
            CoolingTier::L5 => "L5",
        };
        write!(f, "{}", name)
    }
}
