use daily_money_coach::{
    agent::CoachPipeline,
    gemini::{GeminiClient, GenerativeModel},
    memory::BehaviorStore,
    models::{ManualEntry, PipelineResult},
};
use serde_json::json;
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_result(scenario: &str, result: &PipelineResult) {
    println!("\n=== {} (user: {}) ===", scenario, result.user_id);
    println!("{}", result.response_summary);
    println!("\nCoach advice:");
    println!("{}", result.coach_advice.investment_tip);
    println!("{}", result.coach_advice.optimization_suggestion);
    println!("{}", result.coach_advice.motivational_nudge);
    if let Ok(trace) = serde_json::to_string_pretty(&result.trace) {
        println!("\nTrace:\n{}", trace);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Without an API key the pipeline runs deterministic-only; that is a
    // supported mode, not an error.
    let model: Option<Arc<dyn GenerativeModel>> = match env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => {
            info!("Gemini model adapter enabled");
            Some(Arc::new(GeminiClient::new(key)))
        }
        _ => {
            info!("No GEMINI_API_KEY set, running deterministic-only");
            None
        }
    };

    let store = Arc::new(BehaviorStore::seeded());
    let pipeline = CoachPipeline::new(store, model);

    // Growth path: stable finances, high discipline, three input channels.
    let manual = vec![ManualEntry {
        category: Some("FOOD".to_string()),
        amount: json!(5.0),
    }];
    let growth = pipeline
        .handle_message("Debit $15.00 purchase.", "stable_user", &manual, "GROCERY $75.00")
        .await?;
    print_result("GROWTH: Stable Finances, High Discipline", &growth);

    // Survival path: single low-confidence channel triggers the guardrail.
    let survival = pipeline
        .handle_message("Debit $1000.00 critical expense.", "fragile_user", &[], "")
        .await?;
    print_result("SURVIVAL: High Risk / Low Confidence", &survival);

    // Verifier path: no expenses; the scam catalog entry is still blocked.
    let verified = pipeline
        .handle_message("No expenses today.", "stable_user", &[], "")
        .await?;
    print_result("VERIFIER: Scam Blocking (Earning Options)", &verified);

    Ok(())
}
