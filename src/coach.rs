//! Advice composer
//!
//! Produces the three-part coaching text from the plan, the sensed state
//! and the behavioral fingerprint. Deterministic templates are always
//! available; a model may substitute richer phrasing, but its response
//! must populate exactly the same three fields or it is discarded.

use crate::error::PipelineError;
use crate::gemini::GenerativeModel;
use crate::models::{BehaviorFingerprint, CoachAdvice, PlannerOutput, PriorityLevel, SenseState};
use crate::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Below this balance the "safety first" investment template is used even
/// outside Survival.
pub const LOW_BALANCE_THRESHOLD_CENTS: u64 = 50_000;

const COACH_SYSTEM_PROMPT: &str = "You are a compassionate, expert financial concierge. Generate \
highly specific, 3-point advice blocks. Use detailed markdown and emojis. Tailor the optimization \
advice specifically to the 'RiskyCategory'. Output must be a clean JSON object with \
'investment_tip', 'optimization_suggestion' and 'motivational_nudge'.";

pub struct AdviceComposer {
    model: Option<Arc<dyn GenerativeModel>>,
}

impl AdviceComposer {
    pub fn new(model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self { model }
    }

    pub fn deterministic() -> Self {
        Self { model: None }
    }

    pub async fn compose(
        &self,
        state: &SenseState,
        plan: &PlannerOutput,
        fingerprint: &BehaviorFingerprint,
    ) -> CoachAdvice {
        if let Some(model) = &self.model {
            match self
                .try_model_advice(model.as_ref(), state, plan, fingerprint)
                .await
            {
                Ok(advice) => return advice,
                Err(e) => {
                    warn!(error = %e, "Model advice unusable, using deterministic templates");
                }
            }
        }

        deterministic_advice(state, plan, fingerprint)
    }

    async fn try_model_advice(
        &self,
        model: &dyn GenerativeModel,
        state: &SenseState,
        plan: &PlannerOutput,
        fingerprint: &BehaviorFingerprint,
    ) -> Result<CoachAdvice> {
        let status = json!({
            "Priority": plan.priority_level,
            "Balance": format!("${:.2}", state.balance_est_cents as f64 / 100.0),
            "RiskyCategory": fingerprint.recent_risky_category,
            "FollowStreak": fingerprint.plan_follow_streak,
        });
        let prompt = format!(
            "Generate advice for a user with the following status: {}",
            status
        );

        let value = model.generate_json(COACH_SYSTEM_PROMPT, &prompt).await?;
        let advice: CoachAdvice = serde_json::from_value(value)?;

        if advice.investment_tip.trim().is_empty()
            || advice.optimization_suggestion.trim().is_empty()
            || advice.motivational_nudge.trim().is_empty()
        {
            return Err(PipelineError::ModelRejected(
                "Advice fields incomplete".to_string(),
            ));
        }

        Ok(advice)
    }
}

/// Deterministic template path. No numeric computation beyond currency
/// formatting.
fn deterministic_advice(
    state: &SenseState,
    plan: &PlannerOutput,
    fingerprint: &BehaviorFingerprint,
) -> CoachAdvice {
    let risky_cat = &fingerprint.recent_risky_category;

    let investment_tip = if plan.priority_level == PriorityLevel::Survival
        || state.balance_est_cents < LOW_BALANCE_THRESHOLD_CENTS
    {
        "## 💰 Investment Priority: Safety First\n\
         1. *Emergency Fund:* Build a $500 safety net. \n\
         2. *Debt Repayment:* Aggressively attack high-interest debt first."
            .to_string()
    } else {
        "## 📈 Smart Investment Strategy\n\
         1. *Automate:* Set up auto-transfer to savings. \n\
         2. *Index Funds:* Focus on low-cost, broad-market index funds."
            .to_string()
    };

    let optimization_suggestion = format!(
        "## 💡 Optimization: {risky_cat} Leakage\n\
         1. *Analyze:* Your spending in *{risky_cat}* is high. Identify the single largest weekly expense here.\n\
         2. *Challenge:* Find a zero-cost alternative for one {risky_cat}-related activity this week.\n\
         3. *Recalculate:* Set a non-negotiable budget for this category for the next 7 days."
    );

    let motivational_nudge = format!(
        "Keep going! Your financial discipline is a muscle—it gets stronger with every small win. \
         Current streak: {} days.",
        fingerprint.plan_follow_streak
    );

    CoachAdvice {
        investment_tip,
        optimization_suggestion,
        motivational_nudge,
    }
}
