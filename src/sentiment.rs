/// Sentiment classification engine
///
/// Orchestrates the text pipeline: clean, classify (external capability with
/// chunking for long inputs), derive emotions/key phrases, and compose the
/// overall tone. Degrades to deterministic keyword-ratio scoring whenever the
/// external classifier is unconfigured, errors, or is circuit-broken.
use std::sync::Arc;

use crate::classifier::TextClassifier;
use crate::models::{Classification, SentimentLabel, SentimentResult};
use crate::preprocess::{chunk_text, clean_text};
use crate::signals::{determine_overall_tone, extract_emotions, extract_key_phrases};

/// Texts longer than this (in characters) are chunked before classification
/// to respect the external classifier's input-length limit.
const CHUNK_THRESHOLD: usize = 500;

/// Maximum chunk length handed to the classifier.
const CHUNK_MAX_LEN: usize = 500;

/// Cap applied to the keyword-ratio fallback score.
const FALLBACK_SCORE_CAP: f64 = 0.9;

/// Positive keywords for the fallback scorer.
const POSITIVE_KEYWORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic",
    "love", "like", "happy", "satisfied", "pleased", "thank", "thanks",
    "awesome", "perfect", "outstanding", "superb", "brilliant",
];

/// Negative keywords for the fallback scorer.
const NEGATIVE_KEYWORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "disappointed", "angry",
    "frustrated", "upset", "hate", "dislike", "poor", "worst",
    "unhappy", "dissatisfied", "annoyed", "irritated", "mad",
];

/// Keyword-ratio fallback scorer.
///
/// Counts the matched keywords of each polarity set, divides by the word
/// count, and picks the larger ratio's label; exact ties are neutral with
/// score 0.5. The winning score is `min(0.9, 0.5 + ratio)`.
pub fn fallback_sentiment(text: &str) -> Classification {
    let text_lower = text.to_lowercase();

    let total_words = text.split_whitespace().count();
    if total_words == 0 {
        return Classification::neutral();
    }

    let positive_count = POSITIVE_KEYWORDS
        .iter()
        .filter(|k| text_lower.contains(**k))
        .count();
    let negative_count = NEGATIVE_KEYWORDS
        .iter()
        .filter(|k| text_lower.contains(**k))
        .count();

    let positive_ratio = positive_count as f64 / total_words as f64;
    let negative_ratio = negative_count as f64 / total_words as f64;

    if positive_ratio > negative_ratio {
        Classification {
            label: SentimentLabel::Positive,
            score: (0.5 + positive_ratio).min(FALLBACK_SCORE_CAP),
        }
    } else if negative_ratio > positive_ratio {
        Classification {
            label: SentimentLabel::Negative,
            score: (0.5 + negative_ratio).min(FALLBACK_SCORE_CAP),
        }
    } else {
        Classification::neutral()
    }
}

/// Aggregates per-chunk classifications into one result: majority-vote label
/// with mean score.
///
/// Ties are broken by tally insertion order, so the label that first appeared
/// across the chunks wins deterministically.
pub fn aggregate_chunk_results(results: &[Classification]) -> Classification {
    if results.is_empty() {
        return Classification::neutral();
    }

    let mut tally: Vec<(SentimentLabel, usize)> = Vec::new();
    for result in results {
        match tally.iter_mut().find(|(label, _)| *label == result.label) {
            Some((_, count)) => *count += 1,
            None => tally.push((result.label, 1)),
        }
    }

    let mut dominant = tally[0];
    for entry in &tally[1..] {
        if entry.1 > dominant.1 {
            dominant = *entry;
        }
    }

    let mean_score = results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64;

    Classification {
        label: dominant.0,
        score: mean_score,
    }
}

/// Confidence of a chunk aggregation: lower variance across chunk scores
/// means higher confidence (`1 / (1 + std)`).
fn aggregation_confidence(results: &[Classification]) -> f64 {
    if results.len() <= 1 {
        return results.first().map(|r| r.score).unwrap_or(0.0);
    }

    let n = results.len() as f64;
    let mean = results.iter().map(|r| r.score).sum::<f64>() / n;
    let variance = results
        .iter()
        .map(|r| {
            let d = r.score - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    (1.0 / (1.0 + variance.sqrt())).clamp(0.0, 1.0)
}

/// Sentiment analysis engine.
///
/// The classifier handle is injected at the composition root and read-only
/// afterwards; with `None` every request uses the keyword fallback.
pub struct SentimentEngine {
    classifier: Option<Arc<dyn TextClassifier>>,
}

impl SentimentEngine {
    /// Creates the engine with an optional external classification capability.
    pub fn new(classifier: Option<Arc<dyn TextClassifier>>) -> Self {
        Self { classifier }
    }

    /// Full sentiment analysis of one text unit. Never fails.
    ///
    /// Empty or blank text short-circuits to the fixed neutral result without
    /// invoking any classifier.
    pub async fn analyze(&self, text: &str) -> SentimentResult {
        if text.trim().is_empty() {
            return SentimentResult::neutral();
        }

        let cleaned = clean_text(text);

        let (classification, confidence) = self.classify_sentiment(&cleaned).await;
        let emotions = extract_emotions(&cleaned);
        let key_phrases = extract_key_phrases(&cleaned);
        let overall_tone =
            determine_overall_tone(classification.label, classification.score, &emotions);

        SentimentResult {
            sentiment: classification.label,
            score: classification.score.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            emotions,
            key_phrases,
            overall_tone,
        }
    }

    /// Label/score for cleaned text, plus the confidence of that
    /// classification.
    async fn classify_sentiment(&self, text: &str) -> (Classification, f64) {
        let Some(classifier) = &self.classifier else {
            let fallback = fallback_sentiment(text);
            return (fallback, fallback.score);
        };

        if text.len() > CHUNK_THRESHOLD {
            let chunks = chunk_text(text, CHUNK_MAX_LEN);
            tracing::debug!(
                "Text of {} chars split into {} chunks for classification",
                text.len(),
                chunks.len()
            );

            let mut results = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                match classifier.classify(chunk).await {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        tracing::warn!(
                            "Chunk classification via '{}' failed ({}), using keyword fallback",
                            classifier.name(),
                            e
                        );
                        let fallback = fallback_sentiment(text);
                        return (fallback, fallback.score);
                    }
                }
            }

            let aggregated = aggregate_chunk_results(&results);
            (aggregated, aggregation_confidence(&results))
        } else {
            match classifier.classify(text).await {
                Ok(result) => (result, result.score),
                Err(e) => {
                    tracing::warn!(
                        "Classification via '{}' failed ({}), using keyword fallback",
                        classifier.name(),
                        e
                    );
                    let fallback = fallback_sentiment(text);
                    (fallback, fallback.score)
                }
            }
        }
    }
}
