//! Recommendation verifier
//!
//! A pure content-safety gate over the static earning-recommendation
//! catalog: entries at or above the risk threshold (scam and predatory
//! listings) are dropped before any persona or risk-tier logic runs.

use crate::models::{Recommendation, VerificationReport, VerificationStatus};
use crate::observe;
use lazy_static::lazy_static;
use serde_json::json;

/// Catalog entries with a risk score at or above this are never surfaced.
pub const MAX_SAFE_RISK_SCORE: f64 = 0.5;

fn rec(name: &str, kind: &str, risk_score: f64, tags: &[&str]) -> Recommendation {
    Recommendation {
        name: name.to_string(),
        kind: kind.to_string(),
        risk_score,
        relevance_tags: tags.iter().map(|t| (*t).to_string()).collect(),
    }
}

lazy_static! {
    /// Static earning-recommendation catalog. External data; the pipeline
    /// never mutates it.
    pub static ref CATALOG: Vec<Recommendation> = vec![
        // Transport / gig work
        rec("Local Delivery Routes", "gig", 0.2, &["TRANSPORT", "FLEXIBLE", "GIG"]),
        rec("Independent Rideshare Driver (High-Rated)", "gig", 0.2, &["TRANSPORT", "FLEXIBLE", "GIG"]),
        // Academic
        rec("Campus Tutoring (Math/Science)", "academic", 0.1, &["STUDENT", "SKILL", "FLEXIBLE"]),
        rec("Research Assistant Data Entry", "academic", 0.1, &["STUDENT", "EASY", "REMOTE"]),
        // Low-stress / fixed
        rec("Retirement Community Part-Time Receptionist", "fixed", 0.05, &["RETIREE", "FIXED", "LOW_STRESS"]),
        rec("Elderly Companion Care (Low-Stress)", "gig", 0.1, &["RETIREE", "GIG", "FLEXIBLE"]),
        // Creative / remote
        rec("Online Freelance Copywriting", "remote", 0.3, &["FLEXIBLE", "SKILL", "ARTIST"]),
        rec("Family Event Photographer", "gig", 0.25, &["FAMILY", "ARTIST", "FLEXIBLE"]),
        rec("Virtual Assistant for Startups", "remote", 0.2, &["SKILL", "SALARIED", "FLEXIBLE"]),
        // Household
        rec("Household/Errand Runner (Local)", "gig", 0.15, &["FAMILY", "FLEXIBLE", "GIG"]),
        // Universal low-effort default
        rec("Online Survey/Data Annotation", "remote", 0.1, &["ANY", "EASY", "LOW_PAY"]),
        // Predatory listing; must always be filtered out
        rec("High-Yield Investment Trading Bot", "scam", 0.99, &[]),
    ];
}

/// Filter an arbitrary catalog down to its safe entries.
pub fn verify(catalog: &[Recommendation]) -> VerificationReport {
    let verified: Vec<Recommendation> = catalog
        .iter()
        .filter(|entry| entry.risk_score < MAX_SAFE_RISK_SCORE)
        .cloned()
        .collect();

    let status = if verified.is_empty() {
        VerificationStatus::Fail
    } else {
        VerificationStatus::Pass
    };

    observe::emit("Verifier", "VerifiedRecs", json!({ "count": verified.len() }));

    VerificationReport { status, verified }
}

/// Filter the built-in static catalog.
pub fn verify_catalog() -> VerificationReport {
    verify(&CATALOG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scam_entries_are_blocked() {
        let report = verify_catalog();
        assert_eq!(report.status, VerificationStatus::Pass);
        assert_eq!(report.verified.len(), CATALOG.len() - 1);
        assert!(report
            .verified
            .iter()
            .all(|entry| entry.risk_score < MAX_SAFE_RISK_SCORE));
        assert!(!report
            .verified
            .iter()
            .any(|entry| entry.name == "High-Yield Investment Trading Bot"));
    }

    #[test]
    fn test_empty_catalog_fails_verification() {
        let report = verify(&[]);
        assert_eq!(report.status, VerificationStatus::Fail);
        assert!(report.verified.is_empty());
    }

    #[test]
    fn test_summary_format() {
        let report = verify_catalog();
        assert_eq!(
            report.summary(),
            format!("Status: PASS, Recommended Items: {}", report.verified.len())
        );
    }
}
