use std::sync::Arc;
use std::time::Duration;

use crate::artifact_store::FsArtifactStore;
use crate::classifier::{RemoteTextClassifier, TextClassifier};
use crate::config::Config;
use crate::conversation::ConversationAnalyzer;
use crate::errors::AppError;
use crate::model::ScoringModel;
use crate::scoring::LeadScoringEngine;
use crate::sentiment::SentimentEngine;

/// Shared application state: the composition root of the intelligence core.
///
/// Engines are constructed once from configuration and reused for the process
/// lifetime; request handlers receive this state explicitly instead of
/// touching global singletons. All engines are read-only after construction
/// (the scoring model serializes training internally).
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Lead-scoring workflow (trained model with deterministic fallback).
    pub scoring_engine: LeadScoringEngine,
    /// Per-text sentiment analysis.
    pub sentiment_engine: Arc<SentimentEngine>,
    /// Conversation-level analysis over the shared sentiment engine.
    pub conversation_analyzer: ConversationAnalyzer,
}

impl AppState {
    /// Wires the engines from configuration.
    ///
    /// The external classifier is optional: without `SENTIMENT_API_URL` the
    /// sentiment engine runs on its keyword fallback, which keeps the whole
    /// core usable in a degraded mode.
    pub fn from_config(config: Config) -> Result<Arc<Self>, AppError> {
        let store = Arc::new(FsArtifactStore::new(&config.model_dir));
        let model = ScoringModel::new(store, config.scoring_model_name.clone());
        let scoring_engine = LeadScoringEngine::new(model);

        let classifier: Option<Arc<dyn TextClassifier>> = match config.sentiment_api_url {
            Some(ref url) => {
                let remote = RemoteTextClassifier::new(
                    url.clone(),
                    config.sentiment_api_token.clone(),
                    Duration::from_secs(config.sentiment_timeout_secs),
                )?;
                Some(Arc::new(remote))
            }
            None => {
                tracing::info!(
                    "No sentiment classifier configured, sentiment analysis uses keyword fallback"
                );
                None
            }
        };

        let sentiment_engine = Arc::new(SentimentEngine::new(classifier));
        let conversation_analyzer = ConversationAnalyzer::new(sentiment_engine.clone());

        Ok(Arc::new(Self {
            config,
            scoring_engine,
            sentiment_engine,
            conversation_analyzer,
        }))
    }
}
