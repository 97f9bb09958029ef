//! Script to score a single lead from a JSON file.
//!
//! Uses the persisted model under `MODEL_DIR` when one exists; otherwise the
//! deterministic fallback scorer is used, so this works on a fresh checkout.

use dotenvy::dotenv;
use std::env;

use rust_crm_intel::config::Config;
use rust_crm_intel::models::LeadRecord;
use rust_crm_intel::obs;
use rust_crm_intel::state::AppState;

/// Main entry point for the scoring script.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    obs::init_tracing();

    let input_path = env::args()
        .nth(1)
        .ok_or("Usage: score_lead <lead.json>")?;

    let config = Config::from_env()?;
    let state = AppState::from_config(config)?;

    let raw = tokio::fs::read_to_string(&input_path).await?;
    let lead: LeadRecord = serde_json::from_str(&raw)?;

    let result = state.scoring_engine.score_lead(&lead).await;

    tracing::info!(
        "Lead scored: {:.2} ({} risk)",
        result.lead_score,
        result.risk_level
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
