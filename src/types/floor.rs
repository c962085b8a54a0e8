//! Floor definitions: the thirteen constitutional checks

use serde::{Deserialize, Serialize};

/// The fixed set of constitutional floors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FloorId {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
}

impl FloorId {
    /// All floors, in numeric order
    pub const ALL: [FloorId; 13] = [
        FloorId::F1,
        FloorId::F2,
        FloorId::F3,
        FloorId::F4,
        FloorId::F5,
        FloorId::F6,
        FloorId::F7,
        FloorId::F8,
        FloorId::F9,
        FloorId::F10,
        FloorId::F11,
        FloorId::F12,
        FloorId::F13,
    ];

    /// Canonical label used in audit output (e.g. "F12_InjectionDefense")
    pub fn label(&self) -> &'static str {
        match self {
            FloorId::F1 => "F1_Amanah",
            FloorId::F2 => "F2_Truth",
            FloorId::F3 => "F3_TriWitness",
            FloorId::F4 => "F4_Clarity",
            FloorId::F5 => "F5_Peace",
            FloorId::F6 => "F6_Empathy",
            FloorId::F7 => "F7_Humility",
            FloorId::F8 => "F8_Genius",
            FloorId::F9 => "F9_AntiHantu",
            FloorId::F10 => "F10_Ontology",
            FloorId::F11 => "F11_CommandAuth",
            FloorId::F12 => "F12_InjectionDefense",
            FloorId::F13 => "F13_Curiosity",
        }
    }

    /// The HARD/SOFT/DERIVED partition is immutable at runtime
    pub fn kind(&self) -> FloorKind {
        match self {
            FloorId::F1
            | FloorId::F2
            | FloorId::F6
            | FloorId::F7
            | FloorId::F10
            | FloorId::F11
            | FloorId::F12
            | FloorId::F13 => FloorKind::Hard,
            FloorId::F4 | FloorId::F5 | FloorId::F9 => FloorKind::Soft,
            FloorId::F3 | FloorId::F8 => FloorKind::Derived,
        }
    }
}

impl std::fmt::Display for FloorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Floor kind: what a failure forces on the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FloorKind {
    /// Violation forces REJECT
    Hard,
    /// Violation forces CONDITIONAL
    Soft,
    /// Computed from others; advisory
    Derived,
}

/// Passing predicate attached to every reported score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "bound")]
pub enum Threshold {
    /// value >= bound
    AtLeast(f64),
    /// value < bound (strict)
    Below(f64),
    /// value <= bound
    AtMost(f64),
    /// low <= value <= high
    Band(f64, f64),
    /// boolean floor: value 1.0 = true required
    MustHold,
}

impl Threshold {
    /// Evaluate the predicate against a numeric value
    pub fn check(&self, value: f64) -> bool {
        match *self {
            Threshold::AtLeast(b) => value >= b,
            Threshold::Below(b) => value < b,
            Threshold::AtMost(b) => value <= b,
            Threshold::Band(lo, hi) => value >= lo && value <= hi,
            Threshold::MustHold => value >= 0.5,
        }
    }
}

/// One scored floor: carries its kind and threshold so the resolver
/// never has to look them up by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorScore {
    pub floor: FloorId,
    pub value: f64,
    pub kind: FloorKind,
    pub threshold: Threshold,
    pub passed: bool,
    pub reason: String,
}

impl FloorScore {
    /// Score a floor, deriving `passed` from the threshold
    pub fn new(floor: FloorId, value: f64, threshold: Threshold, reason: impl Into<String>) -> Self {
        Self {
            floor,
            value,
            kind: floor.kind(),
            threshold,
            passed: threshold.check(value),
            reason: reason.into(),
        }
    }

    /// Score a boolean floor
    pub fn boolean(floor: FloorId, holds: bool, reason: impl Into<String>) -> Self {
        Self::new(floor, if holds { 1.0 } else { 0.0 }, Threshold::MustHold, reason)
    }

    /// A failed score produced when an evaluator itself errored.
    /// The pipeline continues; the resolver treats it as a floor failure.
    pub fn evaluator_error(floor: FloorId, err: impl std::fmt::Display) -> Self {
        Self {
            floor,
            value: 0.0,
            kind: floor.kind(),
            threshold: Threshold::MustHold,
            passed: false,
            reason: format!("evaluator error: {}", err),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
