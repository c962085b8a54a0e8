//! Lane classifier: deterministic routing of a query to one of four lanes
//!
//! Priority on ties: CRISIS > FACTUAL > CARE > SOCIAL. No indicator match
//! falls back to SOCIAL. The result is recorded at init and never recomputed.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{Lane, Stakes};

lazy_static! {
    // =========================================================================
    // CRISIS: self-harm / emergency language
    // =========================================================================
    static ref RE_CRISIS: Regex = Regex::new(
        r"(?i)\b(suicide|kill myself|end (it all|my life)|want to die|self[- ]harm|hurt(ing)? myself|overdose|can'?t go on)\b"
    ).unwrap();

    // =========================================================================
    // FACTUAL: interrogatives and verifiable-answer verbs
    // =========================================================================
    static ref RE_FACTUAL: Regex = Regex::new(
        r"(?i)\b(what|where|when|why|how|which|who|calculate|compute|convert|define|explain|prove)\b"
    ).unwrap();

    // =========================================================================
    // CARE: emotional-support language (phrase matches weigh double)
    // =========================================================================
    static ref RE_CARE: Regex = Regex::new(
        r"(?i)\b(i('| a)?m (sad|lonely|anxious|scared|depressed|overwhelmed|struggling)|i feel (sad|lost|alone|hopeless|anxious)|grieving|heartbroken|worried about)\b"
    ).unwrap();

    // =========================================================================
    // SOCIAL: greetings and small talk (phrase matches weigh double)
    // =========================================================================
    static ref RE_SOCIAL: Regex = Regex::new(
        r"(?i)\b(hello|hey|good (morning|afternoon|evening)|how are you|how'?s it going|thank(s| you)|nice to meet)\b"
    ).unwrap();

    // =========================================================================
    // Irreversibility markers: raise FACTUAL to HIGH stakes
    // =========================================================================
    static ref RE_IRREVERSIBLE: Regex = Regex::new(
        r"(?i)\b(permanent(ly)?|irreversibl[ey]|forever|destroy|delete all|wipe|no undo|without (a )?backup)\b"
    ).unwrap();
}

/// Deterministic lane classifier
#[derive(Debug, Default)]
pub struct LaneClassifier;

impl LaneClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a query into its lane
    pub fn classify(&self, query: &str) -> Lane {
        let crisis = RE_CRISIS.find_iter(query).count() as f64;
        let factual = RE_FACTUAL.find_iter(query).count() as f64;
        // CARE and SOCIAL indicators are multiword phrases; each match
        // outweighs a single interrogative
        let care = RE_CARE.find_iter(query).count() as f64 * 2.0;
        let social = RE_SOCIAL.find_iter(query).count() as f64 * 2.0;

        let mut best = Lane::Social;
        let mut best_score = 0.0;
        for (lane, score) in [
            (Lane::Crisis, crisis),
            (Lane::Factual, factual),
            (Lane::Care, care),
            (Lane::Social, social),
        ] {
            if score > best_score || (score == best_score && score > 0.0 && lane.priority() > best.priority()) {
                best = lane;
                best_score = score;
            }
        }

        if best_score == 0.0 {
            Lane::Social
        } else {
            best
        }
    }

    /// Stakes: HIGH iff CRISIS, or FACTUAL with irreversibility markers
    pub fn stakes(&self, lane: Lane, query: &str) -> Stakes {
        match lane {
            Lane::Crisis => Stakes::High,
            Lane::Factual if RE_IRREVERSIBLE.is_match(query) => Stakes::High,
            _ => Stakes::Low,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crisis_routing() {
        let c = LaneClassifier::new();
        assert_eq!(c.classify("I want to end my life"), Lane::Crisis);
        assert_eq!(c.stakes(Lane::Crisis, "I want to end my life"), Stakes::High);
    }

    #[test]
    fn test_factual_routing() {
        let c = LaneClassifier::new();
        let q = "What is the capital of France?";
        assert_eq!(c.classify(q), Lane::Factual);
        assert_eq!(c.stakes(Lane::Factual, q), Stakes::Low);
    }

    #[test]
    fn test_factual_irreversible_is_high_stakes() {
        let c = LaneClassifier::new();
        let q = "How do I permanently wipe this disk?";
        assert_eq!(c.classify(q), Lane::Factual);
        assert_eq!(c.stakes(Lane::Factual, q), Stakes::High);
    }

    #[test]
    fn test_greeting_is_social() {
        let c = LaneClassifier::new();
        assert_eq!(c.classify("How are you?"), Lane::Social);
    }

    #[test]
    fn test_care_routing() {
        let c = LaneClassifier::new();
        assert_eq!(c.classify("I'm feeling anxious and I'm struggling today"), Lane::Care);
    }

    #[test]
    fn test_no_indicator_falls_back_to_social() {
        let c = LaneClassifier::new();
        assert_eq!(c.classify("lorem ipsum dolor"), Lane::Social);
    }

    #[test]
    fn test_crisis_beats_factual_on_tie() {
        let c = LaneClassifier::new();
        // One crisis and one factual indicator each
        assert_eq!(c.classify("how do I stop wanting to kill myself"), Lane::Crisis);
    }

    #[test]
    fn test_deterministic() {
        let c = LaneClassifier::new();
        let q = "Why is the sky blue?";
        assert_eq!(c.classify(q), c.classify(q));
    }
}
