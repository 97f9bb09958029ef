use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ============ Lead Scoring Models ============

/// A single activity recorded against a lead (email, call, meeting, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Activity type (e.g. "email", "call", "meeting", "demo", "proposal").
    #[serde(rename = "type")]
    pub activity_type: String,
}

/// Raw lead data as handed over by the CRM layer.
///
/// Every field may be absent; the feature extractor has a documented default
/// for each missing value, so scoring a sparse lead never fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Contact email address.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Job title of the contact.
    pub job_title: Option<String>,
    /// Acquisition source (e.g. "website", "referral", "trade_show").
    pub source: Option<String>,
    /// Stated budget in account currency.
    pub budget: Option<f64>,
    /// Purchase timeline (e.g. "immediate", "within_30_days").
    pub timeline: Option<String>,
    /// Activities recorded against this lead, oldest first.
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Total activity count as tracked by the CRM.
    pub activity_count: Option<f64>,
    /// Days since the last recorded activity.
    pub days_since_last_activity: Option<f64>,
    /// Average response time to this lead, in hours.
    pub avg_response_time_hours: Option<f64>,
    /// Pipeline status (e.g. "closed_won", "qualified"); used as the training
    /// label, ignored during prediction.
    pub status: Option<String>,
}

/// Risk band derived from the lead score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        };
        write!(f, "{}", s)
    }
}

/// Result of scoring a single lead.
///
/// All numeric fields are clamped to their declared ranges regardless of
/// upstream anomalies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Lead score in [0, 100].
    pub lead_score: f64,
    /// Positive-class probability in [0, 1].
    pub conversion_probability: f64,
    /// Confidence in the prediction, in [0, 1].
    pub confidence: f64,
    /// Risk band derived from the score.
    pub risk_level: RiskLevel,
    /// Advisory strings in rule-declaration order.
    pub recommendations: Vec<String>,
}

/// Summary of a completed training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Unique identifier of this training run.
    pub run_id: Uuid,
    /// Held-out accuracy of the trained classifier.
    pub accuracy: f64,
    /// Per-feature importance, in feature-schema order.
    pub feature_importance: Vec<(String, f64)>,
    /// Timestamp the model finished training.
    pub trained_at: DateTime<Utc>,
    /// Number of labeled examples supplied.
    pub examples_total: usize,
    /// Examples used for fitting.
    pub train_count: usize,
    /// Examples held out for evaluation.
    pub test_count: usize,
}

// ============ Sentiment Models ============

/// Sentiment polarity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Label/score pair as returned by a text-classification capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: SentimentLabel,
    /// Classifier score in [0, 1].
    pub score: f64,
}

impl Classification {
    /// Fixed neutral result used for blank input and as the aggregation
    /// identity.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.5,
        }
    }
}

/// Full sentiment analysis of one text unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Polarity label.
    pub sentiment: SentimentLabel,
    /// Sentiment score in [0, 1].
    pub score: f64,
    /// Confidence in [0, 1]. Equals the score for single-chunk results; for
    /// chunked texts it reflects the variance across chunk scores.
    pub confidence: f64,
    /// Intensity per emotion category, each in [0, 1]. Empty for blank input.
    pub emotions: BTreeMap<String, f64>,
    /// Up to 5 topical sentences, in original order.
    pub key_phrases: Vec<String>,
    /// Compound tone label (e.g. "very_positive_joy").
    pub overall_tone: String,
}

impl SentimentResult {
    /// Fixed result for empty or blank input; no classifier is consulted.
    pub fn neutral() -> Self {
        Self {
            sentiment: SentimentLabel::Neutral,
            score: 0.5,
            confidence: 0.0,
            emotions: BTreeMap::new(),
            key_phrases: Vec::new(),
            overall_tone: "neutral".to_string(),
        }
    }
}

// ============ Conversation Models ============

/// One message within a conversation, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Message body; empty content is skipped during analysis.
    pub content: String,
}

/// Direction of the sentiment trend across a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// A point in the conversation where sentiment shifted significantly between
/// consecutive scored messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMoment {
    /// Original index of the message in the input list (skipped empty
    /// messages still count toward this index).
    pub index: usize,
    /// Leading excerpt of the message (at most 100 characters).
    pub excerpt: String,
    /// Absolute score change against the previous scored message.
    pub delta: f64,
    /// Polarity of the message at this moment.
    pub new_sentiment: SentimentLabel,
}

/// Per-label message counts for a conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Conversation-level sentiment analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationAnalysis {
    /// Polarity of the mean score (>0.6 positive, <0.4 negative).
    pub overall_sentiment: SentimentLabel,
    /// Least-squares trend over (message index, score).
    pub sentiment_trend: Trend,
    /// Mean sentiment score, rounded to 3 decimals.
    pub average_sentiment: f64,
    /// Number of adjacent label flips.
    pub sentiment_changes: usize,
    /// Up to 3 significant shifts, in sequence order.
    pub key_moments: Vec<KeyMoment>,
    /// Label counts over all scored messages.
    pub sentiment_distribution: SentimentDistribution,
}

impl ConversationAnalysis {
    /// Documented neutral/zero default for empty or unscorable conversations.
    pub fn neutral() -> Self {
        Self {
            overall_sentiment: SentimentLabel::Neutral,
            sentiment_trend: Trend::Stable,
            average_sentiment: 0.5,
            sentiment_changes: 0,
            key_moments: Vec::new(),
            sentiment_distribution: SentimentDistribution::default(),
        }
    }
}
