use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::circuit_breaker::{create_classifier_circuit_breaker, ClassifierCircuitBreaker};
use crate::errors::AppError;
use crate::models::{Classification, SentimentLabel};

/// External text-classification capability.
///
/// The sentiment engine only depends on this contract; the concrete backend
/// (remote inference service, test mock) is chosen at the composition root.
/// Any error surfaced here sends the engine down its keyword fallback path.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classifies one text unit into a label/score pair.
    async fn classify(&self, text: &str) -> Result<Classification, AppError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Client for a remote text-classification service.
///
/// Sends `POST {base_url}` with `{"text": ...}` and expects
/// `{"label": "positive|negative|neutral", "score": 0.93}`. Calls run through
/// a circuit breaker so a dead classifier fails fast instead of stalling
/// every request on its timeout.
pub struct RemoteTextClassifier {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    breaker: ClassifierCircuitBreaker,
}

/// Wire shape returned by the classification service.
#[derive(Debug, Deserialize)]
struct WireClassification {
    label: String,
    score: f64,
}

impl RemoteTextClassifier {
    /// Creates a new `RemoteTextClassifier`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Endpoint of the classification service.
    /// * `token` - Optional bearer token for authentication.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        base_url: String,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::ClassifierUnavailable(format!("Failed to create classifier client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            token,
            breaker: create_classifier_circuit_breaker(),
        })
    }

    async fn request_classification(&self, text: &str) -> Result<Classification, AppError> {
        let body = serde_json::json!({ "text": text });

        let mut request = self.client.post(&self.base_url).json(&body);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            AppError::ClassifierUnavailable(format!("Classifier request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ClassifierUnavailable(format!(
                "Classifier returned {}: {}",
                status, error_text
            )));
        }

        let wire: WireClassification = response.json().await.map_err(|e| {
            AppError::ClassifierUnavailable(format!("Failed to parse classifier response: {}", e))
        })?;

        Ok(Classification {
            label: parse_label(&wire.label),
            score: wire.score.clamp(0.0, 1.0),
        })
    }
}

#[async_trait]
impl TextClassifier for RemoteTextClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, AppError> {
        use failsafe::futures::CircuitBreaker as _;

        match self.breaker.call(self.request_classification(text)).await {
            Ok(result) => Ok(result),
            Err(failsafe::Error::Inner(e)) => {
                tracing::warn!("Classifier call failed: {}", e);
                Err(e)
            }
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("Classifier circuit is open, rejecting call");
                Err(AppError::ClassifierUnavailable(
                    "circuit breaker open".to_string(),
                ))
            }
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

/// Maps a wire label onto the fixed polarity set. Unknown labels are treated
/// as neutral rather than failing the whole analysis.
fn parse_label(label: &str) -> SentimentLabel {
    match label.to_lowercase().as_str() {
        "positive" => SentimentLabel::Positive,
        "negative" => SentimentLabel::Negative,
        "neutral" => SentimentLabel::Neutral,
        other => {
            tracing::warn!("Unknown classifier label '{}', treating as neutral", other);
            SentimentLabel::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RemoteTextClassifier::new(
            "https://example.com/classify".to_string(),
            Some("token".to_string()),
            Duration::from_secs(30),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(parse_label("POSITIVE"), SentimentLabel::Positive);
        assert_eq!(parse_label("negative"), SentimentLabel::Negative);
        assert_eq!(parse_label("Neutral"), SentimentLabel::Neutral);
        assert_eq!(parse_label("LABEL_7"), SentimentLabel::Neutral);
    }
}
