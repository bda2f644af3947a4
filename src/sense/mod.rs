//! Expense normalizer
//!
//! Turns raw per-channel inputs (SMS-like text, manual entries, OCR-like
//! text) into canonical `ExpenseEvent` records and one aggregate
//! `SenseState`. Each channel parser is a stand-in sensor: keyword triggers
//! for the text channels, direct field coercion for manual entries.
//! This stage never fails the request; malformed manual entries are skipped.

use crate::models::{ChannelSource, ExpenseEvent, ManualEntry, SenseState};
use crate::observe;
use serde_json::{json, Value};
use tracing::debug;

/// Assumed starting balance before today's expenses, in cents.
pub const STARTING_BALANCE_CENTS: u64 = 150_000;

/// Flat average-daily-spend assumption used for the 7-day projection.
pub const AVG_DAILY_SPEND_CENTS: u64 = 5_000;

/// Vendor to category rewrite table. Order is fixed; the first vendor that
/// matches the source label or the category wins.
const VENDOR_MAP: &[(&str, &str)] = &[
    ("STARBUCKS", "COFFEE"),
    ("SBX", "COFFEE"),
    ("CAFE", "COFFEE"),
    ("AMZN", "RETAIL"),
    ("AMAZON", "RETAIL"),
    ("UBEREATS", "DINING"),
    ("DOORDASH", "DINING"),
    ("LYFT", "TRANSPORT"),
    ("UBER", "TRANSPORT"),
    ("BUS", "TRANSPORT"),
    ("GROCERY", "GROCERIES"),
    ("WALMART", "GROCERIES"),
];

/// Parse expense events out of SMS-like free text.
fn parse_sms_transactions(text: &str) -> Vec<ExpenseEvent> {
    let lowered = text.to_lowercase();
    let mut events = Vec::new();

    if lowered.contains("purchase") {
        events.push(ExpenseEvent {
            source: ChannelSource::Sms,
            amount_cents: 1_500,
            category: "FOOD".to_string(),
        });
    }
    if lowered.contains("debit $500") {
        events.push(ExpenseEvent {
            source: ChannelSource::Sms,
            amount_cents: 50_000,
            category: "RENT".to_string(),
        });
    }

    events
}

/// Parse expense events out of OCR/receipt-like free text.
fn parse_scanner_ocr(text: &str) -> Vec<ExpenseEvent> {
    let uppered = text.to_uppercase();
    let mut events = Vec::new();

    if uppered.contains("GROCERY") {
        events.push(ExpenseEvent {
            source: ChannelSource::Scanner,
            amount_cents: 7_500,
            category: "GROCERIES".to_string(),
        });
    }
    if uppered.contains("COFFEE") {
        events.push(ExpenseEvent {
            source: ChannelSource::Scanner,
            amount_cents: 450,
            category: "FOOD".to_string(),
        });
    }

    events
}

/// Coerce a raw manual amount (number or numeric string) into cents.
/// Returns `None` for anything unparsable, non-finite, or <= 0.
fn coerce_amount_cents(amount: &Value) -> Option<u64> {
    let raw = match amount {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !raw.is_finite() {
        return None;
    }

    let cents = (raw * 100.0).round();
    if cents <= 0.0 {
        return None;
    }

    Some(cents as u64)
}

/// Normalize manual entries, skipping malformed ones.
fn normalize_manual_expenses(entries: &[ManualEntry]) -> Vec<ExpenseEvent> {
    entries
        .iter()
        .filter_map(|entry| {
            let amount_cents = coerce_amount_cents(&entry.amount)?;
            let category = entry
                .category
                .as_deref()
                .map(str::to_uppercase)
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "MISC".to_string());

            Some(ExpenseEvent {
                source: ChannelSource::Manual,
                amount_cents,
                category,
            })
        })
        .collect()
}

/// The one permitted category rewrite: map known vendor strings to their
/// canonical category, checking the source label first and the category
/// second, in the fixed table order.
fn clean_and_categorize(mut expense: ExpenseEvent) -> ExpenseEvent {
    let source_label = expense.source.label();
    let category = expense.category.to_uppercase();

    for (vendor, mapped) in VENDOR_MAP {
        if source_label.contains(vendor) || category.contains(vendor) {
            expense.category = (*mapped).to_string();
            return expense;
        }
    }

    expense.category = if category.is_empty() {
        "MISC".to_string()
    } else {
        category
    };
    expense
}

/// Run the full normalization pass over the three input channels.
pub fn run_sense(
    raw_sms_text: &str,
    manual_entries: &[ManualEntry],
    raw_ocr_text: &str,
) -> SenseState {
    let mut all_expenses = parse_sms_transactions(raw_sms_text);
    all_expenses.extend(normalize_manual_expenses(manual_entries));
    all_expenses.extend(parse_scanner_ocr(raw_ocr_text));

    let cleaned: Vec<ExpenseEvent> = all_expenses
        .into_iter()
        .map(clean_and_categorize)
        .collect();

    let total_spent_cents: u64 = cleaned.iter().map(|e| e.amount_cents).sum();

    // Single-channel input is inherently less trustworthy.
    let non_empty_channels = [
        !raw_sms_text.is_empty(),
        !manual_entries.is_empty(),
        !raw_ocr_text.is_empty(),
    ]
    .iter()
    .filter(|present| **present)
    .count();
    let parser_confidence = if non_empty_channels >= 2 { 0.9 } else { 0.4 };

    let balance_est_cents = STARTING_BALANCE_CENTS.saturating_sub(total_spent_cents);
    let shortfall_projection_7d_cents =
        (AVG_DAILY_SPEND_CENTS * 7).saturating_sub(balance_est_cents);

    debug!(
        expense_count = cleaned.len(),
        total_spent_cents,
        balance_est_cents,
        "Sense pass complete"
    );

    observe::emit(
        "SenseWorker",
        "StateGenerated",
        json!({
            "balance": balance_est_cents,
            "confidence": parser_confidence,
        }),
    );

    SenseState {
        balance_est_cents,
        shortfall_projection_7d_cents,
        parser_confidence_score: parser_confidence,
        all_today_expenses: cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual(category: &str, amount: Value) -> ManualEntry {
        ManualEntry {
            category: Some(category.to_string()),
            amount,
        }
    }

    #[test]
    fn test_sms_triggers() {
        let events = parse_sms_transactions("Debit $500 and a purchase today");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].category, "FOOD");
        assert_eq!(events[1].amount_cents, 50_000);
    }

    #[test]
    fn test_sms_unrecognized_text_parses_nothing() {
        assert!(parse_sms_transactions("Debit $1000.00 critical expense").is_empty());
    }

    #[test]
    fn test_ocr_triggers() {
        let events = parse_scanner_ocr("Receipt: grocery run and coffee");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].amount_cents, 7_500);
        assert_eq!(events[1].amount_cents, 450);
    }

    #[test]
    fn test_manual_amount_coercion() {
        assert_eq!(coerce_amount_cents(&json!(5.0)), Some(500));
        assert_eq!(coerce_amount_cents(&json!("12.34")), Some(1_234));
        assert_eq!(coerce_amount_cents(&json!(0)), None);
        assert_eq!(coerce_amount_cents(&json!(-3.2)), None);
        assert_eq!(coerce_amount_cents(&json!("not a number")), None);
        assert_eq!(coerce_amount_cents(&json!(null)), None);
    }

    #[test]
    fn test_malformed_manual_entries_are_skipped() {
        let entries = vec![
            manual("FOOD", json!(5.0)),
            manual("BROKEN", json!("??")),
            ManualEntry::default(),
        ];
        let events = normalize_manual_expenses(&entries);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, "FOOD");
        assert_eq!(events[0].amount_cents, 500);
    }

    #[test]
    fn test_manual_empty_category_defaults_to_misc() {
        let entries = vec![ManualEntry {
            category: None,
            amount: json!(1.0),
        }];
        let events = normalize_manual_expenses(&entries);
        assert_eq!(events[0].category, "MISC");
    }

    #[test]
    fn test_vendor_cleansing_rewrites_category() {
        let event = ExpenseEvent {
            source: ChannelSource::Manual,
            amount_cents: 800,
            category: "cafe".to_string(),
        };
        assert_eq!(clean_and_categorize(event).category, "COFFEE");

        let event = ExpenseEvent {
            source: ChannelSource::Manual,
            amount_cents: 800,
            category: "amazon order".to_string(),
        };
        assert_eq!(clean_and_categorize(event).category, "RETAIL");
    }

    #[test]
    fn test_cleansing_keeps_unknown_category_uppercased() {
        let event = ExpenseEvent {
            source: ChannelSource::Manual,
            amount_cents: 800,
            category: "books".to_string(),
        };
        assert_eq!(clean_and_categorize(event).category, "BOOKS");
    }

    #[test]
    fn test_confidence_single_channel() {
        let state = run_sense("Debit $10.00 purchase.", &[], "");
        assert_eq!(state.parser_confidence_score, 0.4);
    }

    #[test]
    fn test_confidence_multi_channel() {
        let entries = vec![manual("FOOD", json!(5.0))];
        let state = run_sense("Debit $5.00 purchase.", &entries, "GROCERY $75.00");
        assert_eq!(state.parser_confidence_score, 0.9);
        assert_eq!(state.all_today_expenses.len(), 3);
    }

    #[test]
    fn test_balance_and_shortfall_aggregation() {
        // purchase (1500) + manual food (500) + grocery (7500) = 9500
        let entries = vec![manual("FOOD", json!(5.0))];
        let state = run_sense("Debit $5.00 purchase.", &entries, "Receipt: GROCERY $75.00");
        assert_eq!(state.balance_est_cents, 140_500);
        assert_eq!(state.shortfall_projection_7d_cents, 0);
    }

    #[test]
    fn test_balance_clamps_at_zero() {
        let entries = vec![manual("RENT", json!(2_000.0))];
        let state = run_sense("", &entries, "");
        assert_eq!(state.balance_est_cents, 0);
        assert_eq!(state.shortfall_projection_7d_cents, 35_000);
    }
}
