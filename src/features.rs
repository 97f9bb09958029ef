use crate::models::LeadRecord;

/// Fixed, ordered feature schema produced by [`extract_features`].
///
/// The schema is the contract between training and inference: a persisted
/// model artifact records the schema it was trained with, and prediction
/// refuses artifacts whose recorded schema differs from this list.
pub const FEATURE_SCHEMA: &[&str] = &[
    "has_email",
    "has_phone",
    "has_company",
    "has_job_title",
    "company_size_score",
    "source_score",
    "engagement_score",
    "budget_score",
    "timeline_score",
    "activity_count",
    "days_since_last_activity",
    "response_time_score",
];

/// Lookup table for acquisition-source quality.
const SOURCE_SCORES: &[(&str, f64)] = &[
    ("website", 0.7),
    ("referral", 0.9),
    ("cold_call", 0.3),
    ("email_campaign", 0.6),
    ("social_media", 0.5),
    ("trade_show", 0.8),
    ("partner", 0.9),
];

/// Lookup table for purchase-timeline urgency.
const TIMELINE_SCORES: &[(&str, f64)] = &[
    ("immediate", 0.9),
    ("within_30_days", 0.8),
    ("within_90_days", 0.6),
    ("within_6_months", 0.4),
    ("no_timeline", 0.2),
];

/// Weight of each activity type toward the engagement score.
const ACTIVITY_WEIGHTS: &[(&str, f64)] = &[
    ("email", 0.3),
    ("call", 0.5),
    ("meeting", 0.8),
    ("demo", 0.9),
    ("proposal", 1.0),
];

/// Weight applied to activity types not present in [`ACTIVITY_WEIGHTS`].
const UNKNOWN_ACTIVITY_WEIGHT: f64 = 0.1;

/// Sentinel meaning "no activity recorded for a very long time".
const STALE_DAYS_DEFAULT: f64 = 999.0;

/// Ordered mapping from feature name to value.
///
/// Entries always appear in [`FEATURE_SCHEMA`] order when produced by
/// [`extract_features`]; an empty vector represents a lead with no extracted
/// features (used by the fallback scorer's neutral branch and by tests).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(&'static str, f64)>,
}

impl FeatureVector {
    /// Creates a vector with no features.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn push(&mut self, name: &'static str, value: f64) {
        self.entries.push((name, value));
    }

    /// Looks up a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Feature names in schema order.
    pub fn schema(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.to_string()).collect()
    }

    /// Values in schema order, for use as a classifier input row.
    pub fn dense(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extracts the fixed-schema feature vector from a lead record.
///
/// Total and deterministic: every rule has a default for missing source data,
/// so this never fails and repeated calls return identical output.
pub fn extract_features(lead: &LeadRecord) -> FeatureVector {
    let mut features = FeatureVector::empty();

    // Presence flags
    features.push("has_email", presence_flag(lead.email.as_deref()));
    features.push("has_phone", presence_flag(lead.phone.as_deref()));
    features.push("has_company", presence_flag(lead.company.as_deref()));
    features.push("has_job_title", presence_flag(lead.job_title.as_deref()));

    // Company size estimated from the company name
    features.push("company_size_score", company_size_score(lead.company.as_deref()));

    // Source quality
    let source = lead.source.as_deref().unwrap_or("").to_lowercase();
    features.push("source_score", table_lookup(SOURCE_SCORES, &source, 0.5));

    // Engagement across recorded activities
    features.push("engagement_score", engagement_score(lead));

    // Budget and timeline
    features.push("budget_score", budget_score(lead.budget));
    let timeline = lead.timeline.as_deref().unwrap_or("").to_lowercase();
    features.push("timeline_score", table_lookup(TIMELINE_SCORES, &timeline, 0.3));

    // Activity recency and responsiveness
    features.push("activity_count", lead.activity_count.unwrap_or(0.0));
    features.push(
        "days_since_last_activity",
        lead.days_since_last_activity.unwrap_or(STALE_DAYS_DEFAULT),
    );
    features.push("response_time_score", response_time_score(lead));

    debug_assert_eq!(features.schema(), FEATURE_SCHEMA.to_vec());
    features
}

fn presence_flag(value: Option<&str>) -> f64 {
    match value {
        Some(s) if !s.is_empty() => 1.0,
        _ => 0.0,
    }
}

fn table_lookup(table: &[(&str, f64)], key: &str, default: f64) -> f64 {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(default)
}

fn company_size_score(company: Option<&str>) -> f64 {
    let company = company.unwrap_or("").to_lowercase();
    if ["inc", "corp", "llc", "ltd"].iter().any(|w| company.contains(w)) {
        0.8
    } else if ["enterprise", "enterprises"].iter().any(|w| company.contains(w)) {
        1.0
    } else {
        0.5
    }
}

/// Weighted mean over activities, normalized by activity count; 0 with no
/// activities.
fn engagement_score(lead: &LeadRecord) -> f64 {
    if lead.activities.is_empty() {
        return 0.0;
    }

    let total: f64 = lead
        .activities
        .iter()
        .map(|a| {
            table_lookup(
                ACTIVITY_WEIGHTS,
                &a.activity_type.to_lowercase(),
                UNKNOWN_ACTIVITY_WEIGHT,
            )
        })
        .sum();

    (total / lead.activities.len() as f64).min(1.0)
}

/// `min(1, budget / 100_000)` when a positive budget is present; a missing or
/// zero budget scores the neutral 0.5 (a zero budget is "unknown", not "no
/// money").
fn budget_score(budget: Option<f64>) -> f64 {
    match budget {
        Some(b) if b != 0.0 => (b / 100_000.0).clamp(0.0, 1.0),
        _ => 0.5,
    }
}

/// Bucketed responsiveness: faster replies score higher.
fn response_time_score(lead: &LeadRecord) -> f64 {
    let hours = lead.avg_response_time_hours.unwrap_or(999.0);
    if hours <= 1.0 {
        1.0
    } else if hours <= 4.0 {
        0.8
    } else if hours <= 24.0 {
        0.6
    } else if hours <= 72.0 {
        0.4
    } else {
        0.2
    }
}
