//! Core data models for the money-coach pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

/// Input channel that produced an expense record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelSource {
    Sms,
    Manual,
    Scanner,
}

impl ChannelSource {
    /// Uppercase label used by the vendor cleansing pass and trace output.
    pub fn label(&self) -> &'static str {
        match self {
            ChannelSource::Sms => "SMS",
            ChannelSource::Manual => "MANUAL",
            ChannelSource::Scanner => "SCANNER",
        }
    }
}

/// Risk tier gating downstream planning strictness.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Terminal planning outcome. HIGH risk always forces Survival.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityLevel {
    Survival,
    Discipline,
    Growth,
}

/// Which path produced the planner output, for audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTrigger {
    HighRiskFallback,
    ModelResponse,
    FallbackDiscipline,
    FallbackGrowth,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Pass,
    Fail,
}

//
// ================= Sensing =================
//

/// One normalized expense record. Immutable after cleansing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpenseEvent {
    pub source: ChannelSource,
    pub amount_cents: u64,
    pub category: String,
}

/// A manual expense entry as submitted by the user. The amount is kept as a
/// raw JSON value so unparsable submissions can be skipped instead of failing
/// the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualEntry {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: serde_json::Value,
}

/// Aggregate financial snapshot produced once per request by the normalizer.
/// Read-only downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SenseState {
    pub balance_est_cents: u64,
    pub shortfall_projection_7d_cents: u64,
    /// 0.0 to 1.0 confidence in all parsed data.
    pub parser_confidence_score: f64,
    pub all_today_expenses: Vec<ExpenseEvent>,
}

//
// ================= Behavioral Memory =================
//

/// Per-user rolling summary of financial discipline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BehaviorFingerprint {
    /// Clamped to [0.1, 0.95].
    pub discipline_score: f64,
    pub shortfall_frequency_30d: f64,
    pub recent_risky_category: String,
    pub plan_follow_streak: u32,
}

//
// ================= Recommendations =================
//

/// One entry of the static earning-recommendation catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub risk_score: f64,
    pub relevance_tags: Vec<String>,
}

/// Output of the content-safety filter over the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub status: VerificationStatus,
    pub verified: Vec<Recommendation>,
}

impl VerificationReport {
    /// Fixed-format audit summary consumed by the trace assembler.
    pub fn summary(&self) -> String {
        format!(
            "Status: {}, Recommended Items: {}",
            self.status,
            self.verified.len()
        )
    }
}

//
// ================= Planning =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReasoningTrace {
    pub priority_trigger: PriorityTrigger,
}

/// Terminal planner output, consumed only by the advice composer and the
/// trace assembler. `earning_suggestion` is `None` iff the priority is
/// Survival, except when the selected candidate set itself is empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerOutput {
    pub priority_level: PriorityLevel,
    pub today_spend_limit_cents: u64,
    pub micro_task: String,
    pub earning_suggestion: Option<Recommendation>,
    pub reasoning_trace: ReasoningTrace,
}

//
// ================= Coaching =================
//

/// Three-part coaching text. Terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoachAdvice {
    pub investment_tip: String,
    pub optimization_suggestion: String,
    pub motivational_nudge: String,
}

//
// ================= Trace =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputHygiene {
    pub parser_confidence: f64,
    pub total_expenses_recorded: usize,
}

/// Full auditable record of one pipeline run. Every upstream decision
/// artifact is included unmodified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTrace {
    pub priority_level: PriorityLevel,
    pub risk_report: RiskTier,
    pub memory_snapshot: BehaviorFingerprint,
    pub input_hygiene: InputHygiene,
    pub verification_summary: String,
    pub planner_reasoning: ReasoningTrace,
    pub coach_summary: CoachAdvice,
    /// SHA-256 over the rest of the trace, for integrity re-verification.
    pub trace_hash: String,
}

//
// ================= Final Result =================
//

/// Structured result returned by the pipeline entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub user_id: String,
    pub plan: PlannerOutput,
    pub coach_advice: CoachAdvice,
    pub response_summary: String,
    pub trace: DecisionTrace,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriorityLevel::Survival => "SURVIVAL",
            PriorityLevel::Discipline => "DISCIPLINE",
            PriorityLevel::Growth => "GROWTH",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationStatus::Pass => "PASS",
            VerificationStatus::Fail => "FAIL",
        };
        write!(f, "{}", s)
    }
}
