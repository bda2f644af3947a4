//! Micro-planner
//!
//! One classification per request with three terminal outcomes:
//! Survival (deterministic guardrail override on HIGH risk), Discipline,
//! or Growth. The deterministic path is the system of record; a model may
//! propose the Discipline/Growth output, but its response is validated
//! against the same invariants and silently discarded on any failure.

use crate::error::PipelineError;
use crate::gemini::GenerativeModel;
use crate::models::{
    BehaviorFingerprint, PlannerOutput, PriorityLevel, PriorityTrigger, ReasoningTrace,
    Recommendation, RiskTier, SenseState,
};
use crate::Result;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Divisor applied to the balance for the emergency spend limit.
const SURVIVAL_LIMIT_DIVISOR: u64 = 10;

/// Divisor applied to the balance for the normal spend limit.
const NORMAL_LIMIT_DIVISOR: u64 = 5;

/// Discipline score at or above which a user graduates to Growth planning.
const GROWTH_DISCIPLINE_THRESHOLD: f64 = 0.7;

const SURVIVAL_MICRO_TASK: &str =
    "EMERGENCY: Halt all discretionary spending immediately. Review all high-risk subscriptions.";

const GROWTH_MICRO_TASK: &str =
    "Growth Challenge: Automate a small monthly contribution to savings and spend 30 minutes \
     researching one new passive income stream relevant to your skills.";

const PLANNER_SYSTEM_PROMPT: &str = "You are a financial planner generating one actionable \
micro-task and selecting the single best earning suggestion. The VERIFIED_EARNING_RECS list is \
already filtered and ordered for this user; you MUST pick the name of one entry from that list, \
or null when the list is empty. Set priority_level to DISCIPLINE when discipline_score is below \
0.7, otherwise GROWTH. Respond ONLY with a clean JSON object containing 'priority_level', \
'micro_task' and 'earning_suggestion_name'.";

/// Schema the model must satisfy at the planning decision point.
#[derive(Debug, Deserialize)]
struct ModelPlan {
    priority_level: String,
    micro_task: String,
    #[serde(default)]
    earning_suggestion_name: Option<String>,
}

/// Planner with a deterministic fallback always available and an optional
/// model override for the non-guardrail outcomes.
pub struct MicroPlanner {
    model: Option<Arc<dyn GenerativeModel>>,
}

impl MicroPlanner {
    pub fn new(model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self { model }
    }

    /// Deterministic-only planner.
    pub fn deterministic() -> Self {
        Self { model: None }
    }

    /// Produce the plan for one request.
    pub async fn plan(
        &self,
        state: &SenseState,
        fingerprint: &BehaviorFingerprint,
        risk: RiskTier,
        selected: &[Recommendation],
    ) -> PlannerOutput {
        // Guardrail override: HIGH risk forces Survival before any model
        // involvement, so the model can never produce or suppress it.
        if risk == RiskTier::High {
            return survival_plan(state);
        }

        let spend_limit = state.balance_est_cents / NORMAL_LIMIT_DIVISOR;

        if let Some(model) = &self.model {
            match self
                .try_model_plan(model.as_ref(), state, fingerprint, risk, selected, spend_limit)
                .await
            {
                Ok(plan) => return plan,
                Err(e) => {
                    warn!(error = %e, "Model plan unusable, using deterministic fallback");
                }
            }
        }

        deterministic_plan(fingerprint, selected, spend_limit)
    }

    async fn try_model_plan(
        &self,
        model: &dyn GenerativeModel,
        state: &SenseState,
        fingerprint: &BehaviorFingerprint,
        risk: RiskTier,
        selected: &[Recommendation],
        spend_limit: u64,
    ) -> Result<PlannerOutput> {
        let context = json!({
            "SENSE_STATE": state,
            "MEMORY_SNAPSHOT": fingerprint,
            "RISK_LEVEL": risk,
            "VERIFIED_EARNING_RECS": selected,
            "INSTRUCTION": "Generate a micro-plan. HIGH risk is handled upstream; choose DISCIPLINE or GROWTH.",
        });
        let prompt = format!(
            "Analyze the following context:\n{}\n",
            serde_json::to_string_pretty(&context)?
        );

        let value = model.generate_json(PLANNER_SYSTEM_PROMPT, &prompt).await?;
        let proposal: ModelPlan = serde_json::from_value(value)?;

        validate_model_plan(proposal, selected, spend_limit)
    }
}

/// Check a model proposal against the planner invariants and convert it to
/// a `PlannerOutput`, or reject it.
fn validate_model_plan(
    proposal: ModelPlan,
    selected: &[Recommendation],
    spend_limit: u64,
) -> Result<PlannerOutput> {
    let priority_level = match proposal.priority_level.as_str() {
        "DISCIPLINE" => PriorityLevel::Discipline,
        "GROWTH" => PriorityLevel::Growth,
        other => {
            return Err(PipelineError::ModelRejected(format!(
                "Unsupported priority level: {}",
                other
            )))
        }
    };

    if proposal.micro_task.trim().is_empty() {
        return Err(PipelineError::ModelRejected("Empty micro-task".to_string()));
    }

    let earning_suggestion = match proposal
        .earning_suggestion_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
    {
        Some(name) => {
            let matched = selected.iter().find(|r| r.name == name).cloned();
            Some(matched.ok_or_else(|| {
                PipelineError::ModelRejected(format!(
                    "Suggested recommendation not in the selected set: {}",
                    name
                ))
            })?)
        }
        None if selected.is_empty() => None,
        None => {
            return Err(PipelineError::ModelRejected(
                "No earning suggestion while candidates were available".to_string(),
            ))
        }
    };

    Ok(PlannerOutput {
        priority_level,
        today_spend_limit_cents: spend_limit,
        micro_task: proposal.micro_task,
        earning_suggestion,
        reasoning_trace: ReasoningTrace {
            priority_trigger: PriorityTrigger::ModelResponse,
        },
    })
}

/// Emergency plan: tightest spend limit, fixed task, no earning suggestion.
fn survival_plan(state: &SenseState) -> PlannerOutput {
    PlannerOutput {
        priority_level: PriorityLevel::Survival,
        today_spend_limit_cents: state.balance_est_cents / SURVIVAL_LIMIT_DIVISOR,
        micro_task: SURVIVAL_MICRO_TASK.to_string(),
        earning_suggestion: None,
        reasoning_trace: ReasoningTrace {
            priority_trigger: PriorityTrigger::HighRiskFallback,
        },
    }
}

/// Deterministic Discipline/Growth plan.
fn deterministic_plan(
    fingerprint: &BehaviorFingerprint,
    selected: &[Recommendation],
    spend_limit: u64,
) -> PlannerOutput {
    let earning_suggestion = selected.first().cloned();

    if fingerprint.discipline_score < GROWTH_DISCIPLINE_THRESHOLD {
        let risky_title = title_case(&fingerprint.recent_risky_category);
        PlannerOutput {
            priority_level: PriorityLevel::Discipline,
            today_spend_limit_cents: spend_limit,
            micro_task: format!(
                "Discipline Focus: Find two alternative, low-cost options for your *{}* spending \
                 this week. Can you find a free activity or replace one purchase with a homemade \
                 option?",
                risky_title
            ),
            earning_suggestion,
            reasoning_trace: ReasoningTrace {
                priority_trigger: PriorityTrigger::FallbackDiscipline,
            },
        }
    } else {
        PlannerOutput {
            priority_level: PriorityLevel::Growth,
            today_spend_limit_cents: spend_limit,
            micro_task: GROWTH_MICRO_TASK.to_string(),
            earning_suggestion,
            reasoning_trace: ReasoningTrace {
                priority_trigger: PriorityTrigger::FallbackGrowth,
            },
        }
    }
}

/// Title-case a category label: underscores become spaces, each word gets
/// a leading capital ("LATE_NIGHT_FOOD" -> "Late Night Food").
fn title_case(category: &str) -> String {
    category
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Post-planning invariant check. A violation here is a defect in the
/// deterministic path, never a degraded answer.
pub fn enforce_guardrail(
    plan: &PlannerOutput,
    risk: RiskTier,
    selected: &[Recommendation],
) -> Result<()> {
    if risk == RiskTier::High && plan.priority_level != PriorityLevel::Survival {
        return Err(PipelineError::GuardrailViolation(format!(
            "HIGH risk resolved to {}",
            plan.priority_level
        )));
    }

    match plan.priority_level {
        PriorityLevel::Survival => {
            if plan.earning_suggestion.is_some() {
                return Err(PipelineError::GuardrailViolation(
                    "Survival plan carries an earning suggestion".to_string(),
                ));
            }
        }
        _ => {
            if plan.earning_suggestion.is_none() && !selected.is_empty() {
                return Err(PipelineError::GuardrailViolation(
                    "Earning suggestion missing while candidates were available".to_string(),
                ));
            }
        }
    }

    Ok(())
}
