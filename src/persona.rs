//! Persona selector
//!
//! Re-ranks the verified recommendation set for one user. Persona
//! preference determines membership; risk score determines the final
//! order, so the lowest-risk persona-relevant option is always first.

use crate::models::Recommendation;
use crate::verifier::MAX_SAFE_RISK_SCORE;
use tracing::debug;

/// Universal safe default recommendation name.
const GENERIC_TASK: &str = "Online Survey/Data Annotation";

/// Tag marking a recommendation as applicable to any persona.
const UNIVERSAL_TAG: &str = "ANY";

/// Ordered recommendation names preferred by each known persona. Unknown
/// personas get an empty list and fall through to the generic fallbacks.
fn preferred_names(user_id: &str) -> &'static [&'static str] {
    match user_id {
        "stable_user" | "fragile_user" => &[
            "Online Survey/Data Annotation",
            "Local Delivery Routes",
            "Virtual Assistant for Startups",
            "Research Assistant Data Entry",
        ],
        "student_user" => &[
            "Campus Tutoring (Math/Science)",
            "Research Assistant Data Entry",
        ],
        "retiree_user" => &[
            "Retirement Community Part-Time Receptionist",
            "Elderly Companion Care (Low-Stress)",
        ],
        "artist_user" => &[
            "Online Freelance Copywriting",
            "Family Event Photographer",
        ],
        "family_user" => &["Household/Errand Runner (Local)"],
        "gigworker_user" => &[
            "Local Delivery Routes",
            "Independent Rideshare Driver (High-Rated)",
        ],
        _ => &[],
    }
}

/// Personas with their own steady income channel never get the generic
/// low-effort task as a fallback.
fn generic_fallback_excluded(user_id: &str) -> bool {
    user_id == "gigworker_user"
}

/// Select and order recommendations for one user out of the verified set.
/// The result is name-deduplicated and sorted ascending by risk score; it
/// is empty only if the verified set itself is empty.
pub fn select(user_id: &str, risky_category: &str, verified: &[Recommendation]) -> Vec<Recommendation> {
    debug!(user_id, risky_category, "Selecting persona recommendations");

    let mut picked: Vec<Recommendation> = Vec::new();

    // Step 1: persona-curated names, in preference order.
    for name in preferred_names(user_id) {
        if picked.iter().any(|r| r.name == *name) {
            continue;
        }
        if let Some(entry) = verified.iter().find(|r| r.name == *name) {
            picked.push(entry.clone());
        }
    }

    // Step 2: universal safe default.
    if picked.is_empty() && !generic_fallback_excluded(user_id) {
        if let Some(entry) = verified.iter().find(|r| r.name == GENERIC_TASK) {
            picked.push(entry.clone());
        }
    }

    // Step 3: any universally-tagged entry, else any safe entry.
    if picked.is_empty() {
        let fallback = verified
            .iter()
            .find(|r| r.relevance_tags.iter().any(|t| t == UNIVERSAL_TAG))
            .or_else(|| verified.iter().find(|r| r.risk_score < MAX_SAFE_RISK_SCORE));
        if let Some(entry) = fallback {
            picked.push(entry.clone());
        }
    }

    // Step 4: dedupe by name, then order by risk ascending. The sort is
    // stable, so equal-risk entries keep persona preference order.
    let mut selected: Vec<Recommendation> = Vec::with_capacity(picked.len());
    for entry in picked {
        if !selected.iter().any(|r| r.name == entry.name) {
            selected.push(entry);
        }
    }
    selected.sort_by(|a, b| a.risk_score.total_cmp(&b.risk_score));

    selected
}
