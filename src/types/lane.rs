//! Lane and stakes classification types

use serde::{Deserialize, Serialize};

/// Routing class for a query, assigned once at init and never mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lane {
    /// Self-harm / emergency language; always HIGH stakes
    Crisis,
    /// Verifiable factual questions; held to the hard truth threshold
    Factual,
    /// Emotional-support requests
    Care,
    /// Greetings, small talk, everything else
    Social,
}

impl Lane {
    /// Tie-break priority: CRISIS > FACTUAL > CARE > SOCIAL
    pub fn priority(&self) -> u8 {
        match self {
            Lane::Crisis => 3,
            Lane::Factual => 2,
            Lane::Care => 1,
            Lane::Social => 0,
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lane::Crisis => "CRISIS",
            Lane::Factual => "FACTUAL",
            Lane::Care => "CARE",
            Lane::Social => "SOCIAL",
        };
        write!(f, "{}", name)
    }
}

/// Stakes class; raises the bar on F3 and on CRISIS authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stakes {
    Low,
    High,
}

impl std::fmt::Display for Stakes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stakes::Low => write!(f, "LOW"),
            Stakes::High => write!(f, "HIGH"),
        }
    }
}
