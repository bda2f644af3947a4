//! Risk evaluator
//!
//! Deterministic classifier over the sensed financial state. Triggers are
//! evaluated in fixed order; the first true trigger wins.

use crate::models::{RiskTier, SenseState};
use crate::observe;
use serde_json::json;

/// Reason attached to a HIGH escalation, for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    ProjectedShortfall,
    LowParserConfidence,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::ProjectedShortfall => "Projected Shortfall",
            EscalationReason::LowParserConfidence => "Low Parser Confidence",
        }
    }
}

/// Classify without side effects. Exposed so the trigger order itself is
/// observable in tests.
pub fn classify(state: &SenseState) -> (RiskTier, Option<EscalationReason>) {
    // Trigger 1: projected shortfall reaches half the remaining balance.
    // A zero balance makes the right-hand side zero, so any shortfall
    // (including zero) escalates: an empty account is always unsafe.
    if state.shortfall_projection_7d_cents as f64 >= state.balance_est_cents as f64 * 0.5 {
        return (RiskTier::High, Some(EscalationReason::ProjectedShortfall));
    }

    // Trigger 2: untrustworthy sensing alone is grounds for maximum
    // caution, independent of the numbers it produced.
    if state.parser_confidence_score < 0.5 {
        return (RiskTier::High, Some(EscalationReason::LowParserConfidence));
    }

    if state.shortfall_projection_7d_cents > 0 {
        return (RiskTier::Medium, None);
    }

    (RiskTier::Low, None)
}

/// Classify and emit an audit event on escalation.
pub fn evaluate(state: &SenseState) -> RiskTier {
    let (tier, reason) = classify(state);

    if let Some(reason) = reason {
        observe::emit(
            "RiskEvaluator",
            "Escalate",
            json!({ "reason": reason.as_str() }),
        );
    }

    tier
}
