//! Behavioral memory store
//!
//! Holds one rolling history per user key and derives the
//! `BehaviorFingerprint` the planner reads. The store is the only piece of
//! shared cross-request mutable state in the pipeline; access to a single
//! user's history is serialized through a per-key lock so a compliance
//! update cannot race a fingerprint read. Different users proceed in
//! parallel.

use crate::models::BehaviorFingerprint;
use crate::observe;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

const DISCIPLINE_MIN: f64 = 0.1;
const DISCIPLINE_MAX: f64 = 0.95;

/// Stored behavioral history for one user. Cumulative spending is kept as
/// an ordered list so the riskiest-category tie-break stays reproducible.
#[derive(Debug, Clone)]
pub struct UserHistory {
    pub discipline_score: f64,
    pub compliance_days: u32,
    pub risky_spending: Vec<(String, u64)>,
}

impl UserHistory {
    fn new(discipline_score: f64, compliance_days: u32, spending: &[(&str, u64)]) -> Self {
        Self {
            discipline_score,
            compliance_days,
            risky_spending: spending
                .iter()
                .map(|(cat, cents)| ((*cat).to_string(), *cents))
                .collect(),
        }
    }

    /// Default history applied exactly once, at a user's first access.
    fn default_profile() -> Self {
        Self::new(0.6, 3, &[("FOOD", 3_000)])
    }

    /// Category with the maximum cumulative spend; ties break toward the
    /// first entry reaching the maximum. "MISC" when nothing is recorded.
    fn riskiest_category(&self) -> &str {
        let mut best: Option<(&str, u64)> = None;
        for (category, cents) in &self.risky_spending {
            match best {
                Some((_, max)) if *cents <= max => {}
                _ => best = Some((category, *cents)),
            }
        }
        best.map(|(category, _)| category).unwrap_or("MISC")
    }
}

/// Per-user behavioral memory, seeded with the known persona profiles.
pub struct BehaviorStore {
    users: RwLock<HashMap<String, Arc<Mutex<UserHistory>>>>,
}

impl BehaviorStore {
    /// Empty store; every user starts from the default profile.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Store pre-populated with the simulated persona histories.
    pub fn seeded() -> Self {
        let profiles: &[(&str, f64, u32, &[(&str, u64)])] = &[
            ("student_user", 0.6, 5, &[("DINING", 9_000), ("SUBSCRIPTIONS", 2_000)]),
            ("gigworker_user", 0.85, 15, &[("TRANSPORT", 7_500), ("MAINTENANCE", 3_000)]),
            ("salaried_user", 0.7, 10, &[("RETAIL", 12_000), ("TRAVEL", 5_000)]),
            ("retiree_user", 0.9, 30, &[("HEALTH", 15_000), ("INSURANCE", 10_000)]),
            ("artist_user", 0.55, 2, &[("HOBBIES", 8_000), ("MISC", 4_000)]),
            ("family_user", 0.65, 7, &[("CHILDREN", 10_000), ("HOUSING", 15_000)]),
            ("stable_user", 0.9, 20, &[("FOOD", 1_000), ("MISC", 500)]),
            ("fragile_user", 0.4, 1, &[("RETAIL", 8_000), ("COFFEE", 6_000)]),
        ];

        let mut users = HashMap::new();
        for (user_id, discipline, days, spending) in profiles {
            users.insert(
                (*user_id).to_string(),
                Arc::new(Mutex::new(UserHistory::new(*discipline, *days, spending))),
            );
        }

        Self {
            users: RwLock::new(users),
        }
    }

    /// Fetch the per-user history handle, lazily initializing unknown keys
    /// with the default profile.
    async fn entry(&self, user_id: &str) -> Arc<Mutex<UserHistory>> {
        {
            let users = self.users.read().await;
            if let Some(history) = users.get(user_id) {
                return history.clone();
            }
        }

        let mut users = self.users.write().await;
        users
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(UserHistory::default_profile())))
            .clone()
    }

    /// Derive the current fingerprint. Pure read given the stored state.
    pub async fn compute_fingerprint(&self, user_id: &str) -> BehaviorFingerprint {
        let entry = self.entry(user_id).await;
        let history = entry.lock().await;

        let discipline = history.discipline_score.clamp(DISCIPLINE_MIN, DISCIPLINE_MAX);
        let shortfall_frequency = if discipline < 0.5 { 0.05 } else { 0.01 };

        BehaviorFingerprint {
            discipline_score: discipline,
            shortfall_frequency_30d: shortfall_frequency,
            recent_risky_category: history.riskiest_category().to_string(),
            plan_follow_streak: history.compliance_days,
        }
    }

    /// Sole state-transition function over stored behavioral state. Invoked
    /// by the caller after plan execution, outside the planning path.
    pub async fn update_compliance(&self, user_id: &str, complied: bool, spend_limit_cents: u64) {
        let entry = self.entry(user_id).await;
        let mut history = entry.lock().await;

        if complied {
            history.compliance_days += 1;
            history.discipline_score = (history.discipline_score + 0.05).min(DISCIPLINE_MAX);
        } else {
            history.compliance_days = 0;
            history.discipline_score = (history.discipline_score - 0.1).max(DISCIPLINE_MIN);
        }

        observe::emit(
            "BehaviorStore",
            "ComplianceUpdate",
            json!({
                "user": user_id,
                "score": history.discipline_score,
                "spend_limit_cents": spend_limit_cents,
            }),
        );
    }
}

impl Default for BehaviorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_fingerprints() {
        let store = BehaviorStore::seeded();

        let stable = store.compute_fingerprint("stable_user").await;
        assert_eq!(stable.discipline_score, 0.9);
        assert_eq!(stable.recent_risky_category, "FOOD");
        assert_eq!(stable.plan_follow_streak, 20);
        assert_eq!(stable.shortfall_frequency_30d, 0.01);

        let fragile = store.compute_fingerprint("fragile_user").await;
        assert_eq!(fragile.discipline_score, 0.4);
        assert_eq!(fragile.recent_risky_category, "RETAIL");
        assert_eq!(fragile.shortfall_frequency_30d, 0.05);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_default_once() {
        let store = BehaviorStore::seeded();

        let first = store.compute_fingerprint("new_user").await;
        assert_eq!(first.discipline_score, 0.6);
        assert_eq!(first.plan_follow_streak, 3);
        assert_eq!(first.recent_risky_category, "FOOD");

        // The default must persist, not be re-applied.
        store.update_compliance("new_user", true, 10_000).await;
        let second = store.compute_fingerprint("new_user").await;
        assert_eq!(second.plan_follow_streak, 4);
        assert!((second.discipline_score - 0.65).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_compliance_raises_and_caps_discipline() {
        let store = BehaviorStore::seeded();
        for _ in 0..10 {
            store.update_compliance("stable_user", true, 10_000).await;
        }
        let fp = store.compute_fingerprint("stable_user").await;
        assert_eq!(fp.discipline_score, 0.95);
        assert_eq!(fp.plan_follow_streak, 30);
    }

    #[tokio::test]
    async fn test_non_compliance_resets_streak_and_floors_discipline() {
        let store = BehaviorStore::seeded();
        for _ in 0..10 {
            store.update_compliance("fragile_user", false, 10_000).await;
        }
        let fp = store.compute_fingerprint("fragile_user").await;
        assert_eq!(fp.discipline_score, 0.1);
        assert_eq!(fp.plan_follow_streak, 0);
    }

    #[test]
    fn test_riskiest_category_tie_break_is_first_in_order() {
        let history = UserHistory::new(0.6, 0, &[("DINING", 5_000), ("RETAIL", 5_000)]);
        assert_eq!(history.riskiest_category(), "DINING");

        let empty = UserHistory::new(0.6, 0, &[]);
        assert_eq!(empty.riskiest_category(), "MISC");
    }
}
