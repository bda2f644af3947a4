//! Pipeline orchestrator
//!
//! Runs the stages strictly forward, each completing before the next:
//! SENSE → MEMORY → RISK → VERIFY → SELECT → PLAN → COACH → TRACE
//!
//! The deterministic path is the system of record; the optional model only
//! participates inside the planner and advice composer, behind validation.

use crate::audit;
use crate::coach::AdviceComposer;
use crate::gemini::GenerativeModel;
use crate::memory::BehaviorStore;
use crate::models::{ManualEntry, PipelineResult};
use crate::observe;
use crate::planner::{self, MicroPlanner};
use crate::Result;
use crate::{persona, risk, sense, verifier};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// End-to-end decision pipeline for one user base.
pub struct CoachPipeline {
    store: Arc<BehaviorStore>,
    planner: MicroPlanner,
    composer: AdviceComposer,
}

impl CoachPipeline {
    pub fn new(store: Arc<BehaviorStore>, model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self {
            store,
            planner: MicroPlanner::new(model.clone()),
            composer: AdviceComposer::new(model),
        }
    }

    /// Fully deterministic pipeline, no model adapter attached.
    pub fn deterministic(store: Arc<BehaviorStore>) -> Self {
        Self::new(store, None)
    }

    /// Shared handle to the behavioral store, for post-execution
    /// compliance updates.
    pub fn store(&self) -> Arc<BehaviorStore> {
        self.store.clone()
    }

    /// Pipeline entry point. Never fails under normal operation; the only
    /// error path is a guardrail invariant breach, which signals a defect.
    pub async fn handle_message(
        &self,
        raw_sms_text: &str,
        user_id: &str,
        manual_entries: &[ManualEntry],
        raw_ocr_text: &str,
    ) -> Result<PipelineResult> {
        observe::emit("Orchestrator", "Start", json!({ "user": user_id }));

        // 1. SENSE
        let sense_state = sense::run_sense(raw_sms_text, manual_entries, raw_ocr_text);

        // 2. MEMORY
        let fingerprint = self.store.compute_fingerprint(user_id).await;

        // 3. RISK
        let risk_tier = risk::evaluate(&sense_state);
        debug!(user_id, %risk_tier, "Risk evaluation complete");

        // 4. VERIFY
        let verification = verifier::verify_catalog();

        // 5. SELECT
        let selected = persona::select(
            user_id,
            &fingerprint.recent_risky_category,
            &verification.verified,
        );

        // 6. PLAN
        let plan = self
            .planner
            .plan(&sense_state, &fingerprint, risk_tier, &selected)
            .await;
        planner::enforce_guardrail(&plan, risk_tier, &selected)?;

        // 7. COACH
        let coach_advice = self.composer.compose(&sense_state, &plan, &fingerprint).await;

        // 8. TRACE
        let trace = audit::assemble_trace(
            &sense_state,
            &fingerprint,
            risk_tier,
            &verification,
            &plan,
            &coach_advice,
        );

        let response_summary = format!(
            "Plan: {}. Limit: ${:.2}. Task: {}",
            plan.priority_level,
            plan.today_spend_limit_cents as f64 / 100.0,
            plan.micro_task
        );

        info!(
            user_id,
            priority = %plan.priority_level,
            spend_limit_cents = plan.today_spend_limit_cents,
            "Pipeline run complete"
        );
        observe::emit(
            "Orchestrator",
            "Finish",
            json!({ "plan_priority": plan.priority_level }),
        );

        Ok(PipelineResult {
            user_id: user_id.to_string(),
            plan,
            coach_advice,
            response_summary,
            trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriorityLevel, RiskTier};
    use serde_json::json;

    fn manual(category: &str, amount: f64) -> ManualEntry {
        ManualEntry {
            category: Some(category.to_string()),
            amount: json!(amount),
        }
    }

    fn pipeline() -> CoachPipeline {
        CoachPipeline::deterministic(Arc::new(BehaviorStore::seeded()))
    }

    #[tokio::test]
    async fn test_fragile_user_single_channel_goes_survival() {
        let result = pipeline()
            .handle_message("Debit $1000.00 critical expense", "fragile_user", &[], "")
            .await
            .unwrap();

        // One channel -> confidence 0.4 -> HIGH -> Survival guardrail.
        assert_eq!(result.trace.input_hygiene.parser_confidence, 0.4);
        assert_eq!(result.trace.risk_report, RiskTier::High);
        assert_eq!(result.plan.priority_level, PriorityLevel::Survival);
        assert_eq!(result.plan.today_spend_limit_cents, 15_000);
        assert!(result.plan.earning_suggestion.is_none());
        assert!(result.plan.micro_task.contains("EMERGENCY"));
        assert!(result.coach_advice.investment_tip.contains("Safety First"));
    }

    #[tokio::test]
    async fn test_stable_user_three_channels_goes_growth() {
        let entries = vec![manual("FOOD", 5.0)];
        let result = pipeline()
            .handle_message(
                "Debit $5.00 purchase.",
                "stable_user",
                &entries,
                "Receipt: GROCERY $75.00",
            )
            .await
            .unwrap();

        assert_eq!(result.trace.input_hygiene.parser_confidence, 0.9);
        assert_eq!(result.trace.risk_report, RiskTier::Low);
        assert_eq!(result.plan.priority_level, PriorityLevel::Growth);
        assert_eq!(result.plan.today_spend_limit_cents, 140_500 / 5);

        let suggestion = result.plan.earning_suggestion.unwrap();
        assert!(
            suggestion.name == "Online Survey/Data Annotation"
                || suggestion.name == "Local Delivery Routes"
        );
    }

    #[tokio::test]
    async fn test_student_user_goes_discipline_with_academic_gigs() {
        let entries = vec![manual("BOOKS", 25.0)];
        let result = pipeline()
            .handle_message(
                "Debit $12.00 DINING.",
                "student_user",
                &entries,
                "UNIVERSITY COFFEE $5.00",
            )
            .await
            .unwrap();

        assert_eq!(result.plan.priority_level, PriorityLevel::Discipline);
        assert!(result.plan.micro_task.contains("Dining"));

        let allowed = [
            "Campus Tutoring (Math/Science)",
            "Research Assistant Data Entry",
            "Online Survey/Data Annotation",
        ];
        let suggestion = result.plan.earning_suggestion.unwrap();
        assert!(allowed.contains(&suggestion.name.as_str()));
    }

    #[tokio::test]
    async fn test_large_shortfall_goes_survival_at_high_confidence() {
        let entries = vec![manual("RENT", 1_400.0)];
        let result = pipeline()
            .handle_message("No expenses today.", "stable_user", &entries, "")
            .await
            .unwrap();

        // 140000 spent -> balance 10000, shortfall 25000 >= 5000.
        assert_eq!(result.trace.input_hygiene.parser_confidence, 0.9);
        assert_eq!(result.trace.risk_report, RiskTier::High);
        assert_eq!(result.plan.priority_level, PriorityLevel::Survival);
        assert_eq!(result.plan.today_spend_limit_cents, 1_000);
    }

    #[tokio::test]
    async fn test_survival_iff_no_suggestion() {
        let cases: [(&str, &str, Vec<ManualEntry>, &str); 3] = [
            ("Debit $1000.00 critical expense", "fragile_user", vec![], ""),
            (
                "Debit $5.00 purchase.",
                "stable_user",
                vec![manual("FOOD", 5.0)],
                "GROCERY $75.00",
            ),
            (
                "Debit $12.00 DINING.",
                "student_user",
                vec![manual("BOOKS", 25.0)],
                "COFFEE $5.00",
            ),
        ];

        let pipeline = pipeline();
        for (sms, user, entries, ocr) in cases {
            let result = pipeline
                .handle_message(sms, user, &entries, ocr)
                .await
                .unwrap();
            assert_eq!(
                result.plan.priority_level == PriorityLevel::Survival,
                result.plan.earning_suggestion.is_none(),
                "user {}",
                user
            );
        }
    }

    #[tokio::test]
    async fn test_identical_inputs_are_idempotent() {
        let pipeline = pipeline();
        let entries = vec![manual("FOOD", 5.0)];

        let first = pipeline
            .handle_message("Debit $5.00 purchase.", "stable_user", &entries, "GROCERY")
            .await
            .unwrap();
        let second = pipeline
            .handle_message("Debit $5.00 purchase.", "stable_user", &entries, "GROCERY")
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.trace.trace_hash, second.trace.trace_hash);
    }

    #[tokio::test]
    async fn test_compliance_update_changes_next_plan() {
        let pipeline = pipeline();
        let entries = vec![manual("FOOD", 5.0)];

        // salaried_user starts exactly at the growth threshold.
        let before = pipeline
            .handle_message("Debit $5.00 purchase.", "salaried_user", &entries, "GROCERY")
            .await
            .unwrap();
        assert_eq!(before.plan.priority_level, PriorityLevel::Growth);

        pipeline
            .store()
            .update_compliance("salaried_user", false, before.plan.today_spend_limit_cents)
            .await;

        let after = pipeline
            .handle_message("Debit $5.00 purchase.", "salaried_user", &entries, "GROCERY")
            .await
            .unwrap();
        assert_eq!(after.plan.priority_level, PriorityLevel::Discipline);
    }

    #[tokio::test]
    async fn test_trace_summary_and_hash() {
        let result = pipeline()
            .handle_message("Debit $10.00 purchase.", "fragile_user", &[], "")
            .await
            .unwrap();

        assert!(result
            .trace
            .verification_summary
            .starts_with("Status: PASS, Recommended Items: "));
        assert!(audit::verify_trace(&result.trace));
        assert!(result.response_summary.starts_with("Plan: SURVIVAL. Limit: $"));
    }
}
