use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory where trained model artifacts are persisted.
    pub model_dir: String,
    /// Identifier of the lead-scoring artifact within `model_dir`.
    pub scoring_model_name: String,
    /// Base URL of the external text-classification service (optional; the
    /// sentiment engine degrades to keyword scoring without it).
    pub sentiment_api_url: Option<String>,
    /// Bearer token for the text-classification service.
    pub sentiment_api_token: Option<String>,
    /// Request timeout for classifier calls, in seconds.
    pub sentiment_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            model_dir: std::env::var("MODEL_DIR")
                .unwrap_or_else(|_| "./models".to_string())
                .trim()
                .to_string(),
            scoring_model_name: std::env::var("SCORING_MODEL_NAME")
                .unwrap_or_else(|_| "lead_scoring".to_string())
                .trim()
                .to_string(),
            sentiment_api_url: std::env::var("SENTIMENT_API_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("SENTIMENT_API_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?,
            sentiment_api_token: std::env::var("SENTIMENT_API_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            sentiment_timeout_secs: std::env::var("SENTIMENT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("SENTIMENT_TIMEOUT_SECS must be a positive integer")
                })?,
        };

        if config.model_dir.is_empty() {
            anyhow::bail!("MODEL_DIR cannot be empty");
        }
        if config.scoring_model_name.is_empty() {
            anyhow::bail!("SCORING_MODEL_NAME cannot be empty");
        }
        if config.sentiment_timeout_secs == 0 {
            anyhow::bail!("SENTIMENT_TIMEOUT_SECS must be greater than zero");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Model dir: {}", config.model_dir);
        tracing::debug!("Scoring model name: {}", config.scoring_model_name);
        if let Some(ref url) = config.sentiment_api_url {
            tracing::info!("Sentiment classifier configured: {}", url);
        } else {
            tracing::info!("No sentiment classifier configured, keyword fallback will be used");
        }
        tracing::debug!("Classifier timeout: {}s", config.sentiment_timeout_secs);

        Ok(config)
    }
}

impl Default for Config {
    /// Default configuration for tests and local tooling: artifacts under
    /// `./models`, no external classifier.
    fn default() -> Self {
        Self {
            model_dir: "./models".to_string(),
            scoring_model_name: "lead_scoring".to_string(),
            sentiment_api_url: None,
            sentiment_api_token: None,
            sentiment_timeout_secs: 30,
        }
    }
}
