//! Trace assembly and integrity hashing
//!
//! Pure aggregation of every stage's output into one auditable record.
//! No decision logic lives here; the assembled trace must include every
//! upstream decision artifact unmodified.

use crate::models::{
    BehaviorFingerprint, CoachAdvice, DecisionTrace, InputHygiene, PlannerOutput, RiskTier,
    SenseState, VerificationReport,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;

/// Merge all stage outputs into the final decision trace. The trace hash
/// covers every field so a stored trace can be re-verified later.
pub fn assemble_trace(
    state: &SenseState,
    fingerprint: &BehaviorFingerprint,
    risk: RiskTier,
    verification: &VerificationReport,
    plan: &PlannerOutput,
    advice: &CoachAdvice,
) -> DecisionTrace {
    let mut trace = DecisionTrace {
        priority_level: plan.priority_level,
        risk_report: risk,
        memory_snapshot: fingerprint.clone(),
        input_hygiene: InputHygiene {
            parser_confidence: state.parser_confidence_score,
            total_expenses_recorded: state.all_today_expenses.len(),
        },
        verification_summary: verification.summary(),
        planner_reasoning: plan.reasoning_trace.clone(),
        coach_summary: advice.clone(),
        trace_hash: String::new(),
    };

    trace.trace_hash = integrity_hash(&trace);
    trace
}

/// Re-check a stored trace against its embedded hash.
pub fn verify_trace(trace: &DecisionTrace) -> bool {
    let mut unhashed = trace.clone();
    unhashed.trace_hash = String::new();
    integrity_hash(&unhashed) == trace.trace_hash
}

/// Compute the SHA-256 hash of a serializable value.
/// Streams JSON directly into the hasher (no intermediate String).
pub fn integrity_hash<T: Serialize>(value: &T) -> String {
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), value).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
