/// Conversation-level sentiment analysis
///
/// Iterates the sentiment engine over an ordered message list and derives
/// higher-level signals: overall polarity, least-squares trend, label-flip
/// count, and the key moments where sentiment shifted significantly.
use std::sync::Arc;

use crate::models::{
    ConversationAnalysis, ConversationMessage, KeyMoment, SentimentDistribution, SentimentLabel,
    Trend,
};
use crate::scoring::round_dp;
use crate::sentiment::SentimentEngine;

/// Mean score above which the conversation is positive overall.
const POSITIVE_MEAN_THRESHOLD: f64 = 0.6;

/// Mean score below which the conversation is negative overall.
const NEGATIVE_MEAN_THRESHOLD: f64 = 0.4;

/// Least-squares slope beyond which the trend is improving/declining.
const TREND_SLOPE_THRESHOLD: f64 = 0.05;

/// Score change between consecutive messages that marks a key moment.
const SIGNIFICANT_DELTA: f64 = 0.3;

/// Maximum number of key moments reported.
const MAX_KEY_MOMENTS: usize = 3;

/// Maximum excerpt length, in characters.
const EXCERPT_CHARS: usize = 100;

/// Polarity of a score under the conversation thresholds.
pub fn label_for_score(score: f64) -> SentimentLabel {
    if score > POSITIVE_MEAN_THRESHOLD {
        SentimentLabel::Positive
    } else if score < NEGATIVE_MEAN_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Trend of a score sequence: first-degree least-squares slope over
/// (position, score), thresholded at ±0.05. Fewer than 2 scores is stable.
pub fn trend_for(scores: &[f64]) -> Trend {
    if scores.len() < 2 {
        return Trend::Stable;
    }

    let n = scores.len() as f64;
    let sum_x: f64 = (0..scores.len()).map(|i| i as f64).sum();
    let sum_y: f64 = scores.iter().sum();
    let sum_xy: f64 = scores.iter().enumerate().map(|(i, s)| i as f64 * s).sum();
    let sum_x2: f64 = (0..scores.len()).map(|i| (i as f64) * (i as f64)).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return Trend::Stable;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;

    if slope > TREND_SLOPE_THRESHOLD {
        Trend::Improving
    } else if slope < -TREND_SLOPE_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Analyzes conversations by running each message through the sentiment
/// engine.
pub struct ConversationAnalyzer {
    engine: Arc<SentimentEngine>,
}

impl ConversationAnalyzer {
    /// Creates the analyzer around a shared sentiment engine.
    pub fn new(engine: Arc<SentimentEngine>) -> Self {
        Self { engine }
    }

    /// Analyzes an ordered message list. Never fails; an empty list or a list
    /// with no scorable content yields the documented neutral default.
    ///
    /// Messages with empty content are skipped from the label/score
    /// sequences but keep their original index for key-moment attribution.
    pub async fn analyze(&self, messages: &[ConversationMessage]) -> ConversationAnalysis {
        if messages.is_empty() {
            return ConversationAnalysis::neutral();
        }

        // (original index, label, score, content) per scorable message
        let mut scored: Vec<(usize, SentimentLabel, f64, &str)> = Vec::new();
        for (index, message) in messages.iter().enumerate() {
            if message.content.trim().is_empty() {
                continue;
            }
            let result = self.engine.analyze(&message.content).await;
            scored.push((index, result.sentiment, result.score, &message.content));
        }

        if scored.is_empty() {
            return ConversationAnalysis::neutral();
        }

        let scores: Vec<f64> = scored.iter().map(|(_, _, s, _)| *s).collect();
        let average = scores.iter().sum::<f64>() / scores.len() as f64;

        let sentiment_changes = scored
            .windows(2)
            .filter(|pair| pair[0].1 != pair[1].1)
            .count();

        let mut key_moments = Vec::new();
        for pair in scored.windows(2) {
            let (_, _, previous_score, _) = pair[0];
            let (index, _, score, content) = pair[1];
            let delta = (score - previous_score).abs();
            if delta > SIGNIFICANT_DELTA {
                key_moments.push(KeyMoment {
                    index,
                    excerpt: content.chars().take(EXCERPT_CHARS).collect(),
                    delta: round_dp(delta, 3),
                    new_sentiment: label_for_score(score),
                });
                if key_moments.len() == MAX_KEY_MOMENTS {
                    break;
                }
            }
        }

        let mut distribution = SentimentDistribution::default();
        for (_, label, _, _) in &scored {
            match label {
                SentimentLabel::Positive => distribution.positive += 1,
                SentimentLabel::Negative => distribution.negative += 1,
                SentimentLabel::Neutral => distribution.neutral += 1,
            }
        }

        ConversationAnalysis {
            overall_sentiment: label_for_score(average),
            sentiment_trend: trend_for(&scores),
            average_sentiment: round_dp(average, 3),
            sentiment_changes,
            key_moments,
            sentiment_distribution: distribution,
        }
    }
}
