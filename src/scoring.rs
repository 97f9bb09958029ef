/// Deterministic scoring path shared by the lead-scoring workflow
///
/// This module provides the non-ML half of the engine:
/// 1. Weighted-sum fallback scoring when no trained model is usable
/// 2. Feature-completeness prediction confidence
/// 3. Risk-band classification over the lead score
/// 4. Rule-based recommendations
/// 5. The `LeadScoringEngine` workflow tying both paths together
use crate::errors::AppError;
use crate::features::{extract_features, FeatureVector};
use crate::model::ScoringModel;
use crate::models::{LeadRecord, RiskLevel, ScoreResult, TrainingReport};

/// Weights of the fallback linear combination, in evaluation order.
const FALLBACK_WEIGHTS: &[(&str, f64)] = &[
    ("has_email", 0.1),
    ("has_phone", 0.1),
    ("has_company", 0.15),
    ("has_job_title", 0.1),
    ("company_size_score", 0.15),
    ("source_score", 0.2),
    ("engagement_score", 0.3),
    ("budget_score", 0.2),
    ("timeline_score", 0.15),
    ("activity_count", 0.1),
    ("response_time_score", 0.1),
];

/// Features that must be present and non-zero for full prediction confidence.
const REQUIRED_FEATURES: &[&str] = &[
    "has_email",
    "has_phone",
    "has_company",
    "has_job_title",
    "source_score",
    "engagement_score",
    "budget_score",
    "timeline_score",
];

/// Base confidence granted before feature completeness is considered.
const BASE_CONFIDENCE: f64 = 0.2;

/// Neutral score returned when no weighted feature is present.
const NEUTRAL_SCORE: f64 = 50.0;

/// Confidence reported on the fallback path, reflecting reduced trust versus
/// a trained model.
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Rounds to `dp` decimal places.
pub(crate) fn round_dp(value: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    (value * factor).round() / factor
}

/// Weighted linear combination over the fixed feature subset, normalized by
/// the weights of features actually present and scaled to [0, 100].
///
/// Returns the neutral 50.0 when none of the weighted features is present.
pub fn fallback_score(features: &FeatureVector) -> f64 {
    let mut total = 0.0;
    let mut weight_sum = 0.0;

    for (name, weight) in FALLBACK_WEIGHTS {
        if let Some(value) = features.get(name) {
            total += value * weight;
            weight_sum += weight;
        }
    }

    if weight_sum == 0.0 {
        return NEUTRAL_SCORE;
    }

    // The raw activity_count term can push the composite past 100
    ((total / weight_sum) * 100.0).clamp(0.0, 100.0)
}

/// Confidence derived from feature completeness:
/// `min(1, 0.2 + present / required)`, where present means the feature exists
/// and is non-zero.
pub fn prediction_confidence(features: &FeatureVector) -> f64 {
    let present = REQUIRED_FEATURES
        .iter()
        .filter(|name| features.get(name).map(|v| v > 0.0).unwrap_or(false))
        .count();

    let confidence = present as f64 / REQUIRED_FEATURES.len() as f64;
    round_dp((confidence + BASE_CONFIDENCE).min(1.0), 2)
}

/// Threshold map from lead score to risk band.
pub fn risk_level(lead_score: f64) -> RiskLevel {
    if lead_score >= 80.0 {
        RiskLevel::Low
    } else if lead_score >= 60.0 {
        RiskLevel::Medium
    } else if lead_score >= 40.0 {
        RiskLevel::High
    } else {
        RiskLevel::VeryHigh
    }
}

/// Rule-based advisory strings.
///
/// Rules fire independently and are evaluated in declaration order; every
/// matching rule contributes its strings, so output order is stable.
pub fn recommendations(lead_score: f64, features: &FeatureVector) -> Vec<String> {
    let mut recommendations = Vec::new();

    if lead_score < 40.0 {
        recommendations.push("High risk lead - consider disqualifying".to_string());
        recommendations.push("Focus on qualification before pursuing".to_string());
    }

    if features.get("engagement_score").unwrap_or(0.0) < 0.3 {
        recommendations.push("Low engagement - increase touch points".to_string());
        recommendations.push("Consider different communication channels".to_string());
    }

    if features.get("response_time_score").unwrap_or(0.0) < 0.5 {
        recommendations.push("Slow response times - improve follow-up process".to_string());
    }

    if features.get("budget_score").unwrap_or(0.0) < 0.3 {
        recommendations.push("Budget concerns - focus on value proposition".to_string());
    }

    if lead_score >= 70.0 {
        recommendations.push("High-value lead - prioritize follow-up".to_string());
        recommendations.push("Consider expedited sales process".to_string());
    }

    recommendations
}

/// Builds the complete fallback score result for an extracted feature vector.
pub fn fallback_result(features: &FeatureVector) -> ScoreResult {
    let lead_score = round_dp(fallback_score(features), 2);

    ScoreResult {
        lead_score,
        conversion_probability: round_dp(lead_score / 100.0, 4),
        confidence: FALLBACK_CONFIDENCE,
        risk_level: risk_level(lead_score),
        recommendations: recommendations(lead_score, features),
    }
}

/// Lead-scoring workflow: feature extraction, model (or fallback) scoring,
/// confidence, risk, and recommendations.
pub struct LeadScoringEngine {
    model: ScoringModel,
}

impl LeadScoringEngine {
    /// Creates the engine around an already-constructed scoring model.
    pub fn new(model: ScoringModel) -> Self {
        Self { model }
    }

    /// Scores a single lead. Never fails: any model failure is logged and the
    /// deterministic fallback path is used instead.
    pub async fn score_lead(&self, lead: &LeadRecord) -> ScoreResult {
        let features = extract_features(lead);

        match self.model.predict_probability(&features).await {
            Ok(probability) => {
                let probability = probability.clamp(0.0, 1.0);
                let lead_score = round_dp(probability * 100.0, 2);

                ScoreResult {
                    lead_score,
                    conversion_probability: round_dp(probability, 4),
                    confidence: prediction_confidence(&features),
                    risk_level: risk_level(lead_score),
                    recommendations: recommendations(lead_score, &features),
                }
            }
            Err(AppError::NotFound(msg)) => {
                tracing::info!("No trained model available ({}), using fallback scoring", msg);
                fallback_result(&features)
            }
            Err(AppError::SchemaMismatch { expected, found }) => {
                tracing::warn!(
                    "Persisted model schema ({} features) does not match extractor ({} features), using fallback scoring",
                    found.len(),
                    expected.len()
                );
                fallback_result(&features)
            }
            Err(e) => {
                tracing::warn!("Model prediction failed ({}), using fallback scoring", e);
                fallback_result(&features)
            }
        }
    }

    /// Trains the underlying model on labeled historical leads and persists
    /// the resulting artifact.
    pub async fn train(&self, leads: &[LeadRecord]) -> Result<TrainingReport, AppError> {
        self.model.train(leads).await
    }

    /// Per-feature importance of the currently loaded artifact, in schema
    /// order; empty when no trained model is available.
    pub async fn feature_importance(&self) -> Vec<(String, f64)> {
        self.model.feature_importance().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Activity;

    fn strong_lead() -> LeadRecord {
        LeadRecord {
            email: Some("buyer@example.com".to_string()),
            phone: Some("+15550100".to_string()),
            company: Some("Acme Corp".to_string()),
            job_title: Some("VP Engineering".to_string()),
            source: Some("referral".to_string()),
            budget: Some(150_000.0),
            timeline: Some("immediate".to_string()),
            activities: vec![Activity {
                activity_type: "demo".to_string(),
            }],
            ..LeadRecord::default()
        }
    }

    #[test]
    fn test_fallback_neutral_for_empty_features() {
        assert_eq!(fallback_score(&FeatureVector::empty()), NEUTRAL_SCORE);
    }

    #[test]
    fn test_fallback_strong_lead_lands_in_low_risk_band() {
        let features = extract_features(&strong_lead());
        let score = fallback_score(&features);
        assert!(score >= 80.0, "expected low-risk band, got {}", score);
        assert_eq!(risk_level(score), RiskLevel::Low);
    }

    #[test]
    fn test_fallback_score_is_clamped() {
        // A huge raw activity count cannot push the composite past 100
        let lead = LeadRecord {
            activity_count: Some(5_000.0),
            ..strong_lead()
        };
        let score = fallback_score(&extract_features(&lead));
        assert!(score <= 100.0);
    }

    #[test]
    fn test_risk_thresholds() {
        assert_eq!(risk_level(80.0), RiskLevel::Low);
        assert_eq!(risk_level(79.99), RiskLevel::Medium);
        assert_eq!(risk_level(60.0), RiskLevel::Medium);
        assert_eq!(risk_level(40.0), RiskLevel::High);
        assert_eq!(risk_level(39.99), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_confidence_full_lead() {
        let features = extract_features(&strong_lead());
        // All 8 required features present and non-zero: 0.2 + 1.0, capped at 1
        assert_eq!(prediction_confidence(&features), 1.0);
    }

    #[test]
    fn test_confidence_sparse_lead() {
        let features = extract_features(&LeadRecord::default());
        // source/budget/timeline defaults are non-zero; the rest are 0
        assert!((prediction_confidence(&features) - 0.58).abs() < 1e-9);
    }

    #[test]
    fn test_recommendations_fire_in_declaration_order() {
        let features = extract_features(&LeadRecord::default());
        let recs = recommendations(10.0, &features);
        assert_eq!(recs[0], "High risk lead - consider disqualifying");
        assert!(recs
            .iter()
            .any(|r| r.contains("increase touch points")));
        assert!(recs.iter().any(|r| r.contains("follow-up process")));
        // Budget default is 0.5, so the budget rule must not fire
        assert!(!recs.iter().any(|r| r.contains("value proposition")));
    }

    #[test]
    fn test_fallback_result_fields() {
        let features = extract_features(&strong_lead());
        let result = fallback_result(&features);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        assert!((result.conversion_probability - result.lead_score / 100.0).abs() < 1e-4);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("prioritize follow-up")));
    }
}
