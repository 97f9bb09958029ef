//! Script to train the lead-scoring model from a labeled export.
//!
//! Reads a JSON array of lead records (with their pipeline `status` as the
//! label) from the file given as the first argument, trains the model, and
//! persists the artifact under `MODEL_DIR`.

use dotenvy::dotenv;
use std::env;

use rust_crm_intel::config::Config;
use rust_crm_intel::models::LeadRecord;
use rust_crm_intel::obs;
use rust_crm_intel::state::AppState;

/// Main entry point for the training script.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    obs::init_tracing();

    let input_path = env::args()
        .nth(1)
        .ok_or("Usage: train_model <leads.json>")?;

    let config = Config::from_env()?;
    let state = AppState::from_config(config)?;

    tracing::info!("Loading labeled leads from {}", input_path);
    let raw = tokio::fs::read_to_string(&input_path).await?;
    let leads: Vec<LeadRecord> = serde_json::from_str(&raw)?;
    tracing::info!("Loaded {} leads", leads.len());

    let report = state.scoring_engine.train(&leads).await?;

    tracing::info!(
        "Training complete. Accuracy: {:.3} ({} train / {} test)",
        report.accuracy,
        report.train_count,
        report.test_count
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
