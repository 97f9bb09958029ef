/// Trainable lead-scoring model and artifact lifecycle
///
/// The model is a standard-scaled logistic regression over the fixed feature
/// schema. Training fits scaler and classifier on a deterministic 80/20 split
/// and persists `{classifier, scaler, schema}` as one checksummed artifact;
/// prediction lazily loads the artifact, gates it on the feature schema, and
/// surfaces every failure as a typed error so the engine can fall back.
use chrono::{DateTime, Utc};
use moka::future::Cache;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::artifact_store::ArtifactStore;
use crate::artifact_validator::ValidatedArtifactEnvelope;
use crate::errors::{AppError, ResultExt};
use crate::features::{extract_features, FeatureVector, FEATURE_SCHEMA};
use crate::models::{LeadRecord, TrainingReport};

/// Seed for the deterministic train/test shuffle.
const TRAIN_SPLIT_SEED: u64 = 42;

/// Held-out fraction of the training set.
const TEST_FRACTION: f64 = 0.2;

/// Gradient-descent passes over the training split.
const TRAIN_EPOCHS: usize = 300;

/// Gradient-descent learning rate.
const LEARNING_RATE: f64 = 0.1;

/// Lead statuses counted as converted when deriving training labels.
const CONVERTED_STATUSES: &[&str] = &["closed_won", "qualified"];

/// Per-feature standardization fitted on the training split only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fits mean and standard deviation per column.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n_rows = rows.len() as f64;
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);

        let mut means = vec![0.0; n_cols];
        for row in rows {
            for (j, v) in row.iter().enumerate() {
                means[j] += v;
            }
        }
        for m in &mut means {
            *m /= n_rows;
        }

        let mut stds = vec![0.0; n_cols];
        for row in rows {
            for (j, v) in row.iter().enumerate() {
                let d = v - means[j];
                stds[j] += d * d;
            }
        }
        for s in &mut stds {
            *s = (*s / n_rows).sqrt();
            // Constant columns pass through unscaled
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { means, stds }
    }

    /// Standardizes a single row.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, v)| (v - self.means[j]) / self.stds[j])
            .collect()
    }
}

/// Binary logistic-regression classifier trained by full-batch gradient
/// descent. Deterministic: zero-initialized weights, fixed epoch count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticRegression {
    /// Fits the classifier on standardized rows and binary labels.
    pub fn fit(rows: &[Vec<f64>], labels: &[f64]) -> Self {
        let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut model = Self {
            weights: vec![0.0; n_features],
            bias: 0.0,
        };

        let n = rows.len() as f64;
        for _ in 0..TRAIN_EPOCHS {
            let mut grad_w = vec![0.0; n_features];
            let mut grad_b = 0.0;

            for (row, &label) in rows.iter().zip(labels) {
                let err = model.predict_proba(row) - label;
                for (j, v) in row.iter().enumerate() {
                    grad_w[j] += err * v;
                }
                grad_b += err;
            }

            let step = LEARNING_RATE / n;
            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= step * g;
            }
            model.bias -= step * grad_b;
        }

        model
    }

    /// Positive-class probability for a standardized row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(row)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-z).exp())
    }

    /// Fraction of rows classified correctly at the 0.5 threshold.
    fn accuracy(&self, rows: &[Vec<f64>], labels: &[f64]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        let correct = rows
            .iter()
            .zip(labels)
            .filter(|(row, &label)| (self.predict_proba(row) >= 0.5) == (label == 1.0))
            .count();
        correct as f64 / rows.len() as f64
    }
}

/// The persisted unit of a trained model: classifier, fitted scaler, and the
/// feature schema in effect at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: Vec<String>,
    pub scaler: StandardScaler,
    pub classifier: LogisticRegression,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    /// Normalized absolute classifier weights per feature, in schema order.
    pub fn importances(&self) -> Vec<(String, f64)> {
        let total: f64 = self.classifier.weights.iter().map(|w| w.abs()).sum();
        self.schema
            .iter()
            .zip(&self.classifier.weights)
            .map(|(name, w)| {
                let importance = if total > 0.0 { w.abs() / total } else { 0.0 };
                (name.clone(), importance)
            })
            .collect()
    }
}

/// Trainable scoring model with a lazily-populated artifact cache.
///
/// Prediction reads the last-published immutable artifact snapshot from the
/// cache (keyed by model name); training runs under a writer lock, persists
/// the new artifact, and only then publishes it. Concurrent predictions are
/// safe because published snapshots are read-only.
pub struct ScoringModel {
    store: Arc<dyn ArtifactStore>,
    model_name: String,
    artifact_cache: Cache<String, Arc<ModelArtifact>>,
    train_lock: Mutex<()>,
}

impl ScoringModel {
    /// Creates a model backed by the given artifact store.
    pub fn new(store: Arc<dyn ArtifactStore>, model_name: impl Into<String>) -> Self {
        Self {
            store,
            model_name: model_name.into(),
            artifact_cache: Cache::new(4),
            train_lock: Mutex::new(()),
        }
    }

    /// Loads the artifact from cache or the store, validating integrity and
    /// schema before it is published into the cache. A failed load never
    /// leaves a half-initialized entry behind.
    async fn load_or_get(&self) -> Result<Arc<ModelArtifact>, AppError> {
        if let Some(artifact) = self.artifact_cache.get(&self.model_name).await {
            return Ok(artifact);
        }

        let bytes = self
            .store
            .load(&self.model_name)
            .await
            .context("loading scoring model artifact")?
            .ok_or_else(|| AppError::NotFound(format!("artifact '{}'", self.model_name)))?;

        let payload = ValidatedArtifactEnvelope::from_bytes_validated(&bytes).ok_or_else(|| {
            AppError::ArtifactStore(format!(
                "artifact '{}' failed integrity validation",
                self.model_name
            ))
        })?;

        let artifact: ModelArtifact = serde_json::from_str(&payload).map_err(|e| {
            AppError::ArtifactStore(format!(
                "artifact '{}' could not be deserialized: {}",
                self.model_name, e
            ))
        })?;

        let expected: Vec<String> = FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect();
        if artifact.schema != expected {
            return Err(AppError::SchemaMismatch {
                expected,
                found: artifact.schema,
            });
        }

        let artifact = Arc::new(artifact);
        self.artifact_cache
            .insert(self.model_name.clone(), artifact.clone())
            .await;
        tracing::info!(
            "Scoring model '{}' loaded (trained at {})",
            self.model_name,
            artifact.trained_at
        );
        Ok(artifact)
    }

    /// Positive-class probability for an extracted feature vector.
    ///
    /// Fails with a typed error when no valid artifact is usable; the caller
    /// decides whether to fall back.
    pub async fn predict_probability(&self, features: &FeatureVector) -> Result<f64, AppError> {
        let artifact = self.load_or_get().await?;
        let row = artifact.scaler.transform(&features.dense());
        Ok(artifact.classifier.predict_proba(&row))
    }

    /// Trains on labeled historical leads, persists the artifact, and
    /// publishes it for prediction.
    ///
    /// Training is serialized against itself; predictions keep reading the
    /// previously published snapshot until the new one is inserted.
    pub async fn train(&self, leads: &[LeadRecord]) -> Result<TrainingReport, AppError> {
        let _guard = self.train_lock.lock().await;

        if leads.is_empty() {
            return Err(AppError::NoTrainingData);
        }

        let rows: Vec<Vec<f64>> = leads.iter().map(|l| extract_features(l).dense()).collect();
        let labels: Vec<f64> = leads.iter().map(conversion_label).collect();

        // Deterministic 80/20 split: seeded shuffle, last fifth held out
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        let mut rng = StdRng::seed_from_u64(TRAIN_SPLIT_SEED);
        indices.shuffle(&mut rng);

        let mut test_count = ((rows.len() as f64) * TEST_FRACTION).ceil() as usize;
        if test_count >= rows.len() {
            test_count = 0;
        }
        let train_count = rows.len() - test_count;
        let (train_idx, test_idx) = indices.split_at(train_count);

        let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
        let train_labels: Vec<f64> = train_idx.iter().map(|&i| labels[i]).collect();

        // Scaler is fitted on the training split only
        let scaler = StandardScaler::fit(&train_rows);
        let scaled_train: Vec<Vec<f64>> =
            train_rows.iter().map(|r| scaler.transform(r)).collect();
        let classifier = LogisticRegression::fit(&scaled_train, &train_labels);

        let accuracy = if test_idx.is_empty() {
            tracing::warn!(
                "Training set too small to hold out a test split ({} examples), evaluating on the training split",
                rows.len()
            );
            classifier.accuracy(&scaled_train, &train_labels)
        } else {
            let scaled_test: Vec<Vec<f64>> = test_idx
                .iter()
                .map(|&i| scaler.transform(&rows[i]))
                .collect();
            let test_labels: Vec<f64> = test_idx.iter().map(|&i| labels[i]).collect();
            classifier.accuracy(&scaled_test, &test_labels)
        };

        let artifact = ModelArtifact {
            schema: FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect(),
            scaler,
            classifier,
            trained_at: Utc::now(),
        };

        let report = TrainingReport {
            run_id: Uuid::new_v4(),
            accuracy,
            feature_importance: artifact.importances(),
            trained_at: artifact.trained_at,
            examples_total: rows.len(),
            train_count,
            test_count,
        };

        // Persist as one atomic unit; a save failure leaves the fresh model
        // usable in-process but not durable
        let payload = serde_json::to_string(&artifact)?;
        let envelope = ValidatedArtifactEnvelope::new(payload);
        if let Err(e) = self.store.save(&self.model_name, &envelope.to_bytes()).await {
            tracing::error!(
                "Failed to persist artifact '{}': {}. Trained model remains in memory only",
                self.model_name,
                e
            );
        }

        self.artifact_cache
            .insert(self.model_name.clone(), Arc::new(artifact))
            .await;

        tracing::info!(
            "Training run {} complete: accuracy {:.3} over {} examples ({} train / {} test)",
            report.run_id,
            report.accuracy,
            report.examples_total,
            report.train_count,
            report.test_count
        );

        Ok(report)
    }

    /// Importances of the currently loaded artifact; empty when no trained
    /// model is available.
    pub async fn feature_importance(&self) -> Vec<(String, f64)> {
        match self.load_or_get().await {
            Ok(artifact) => artifact.importances(),
            Err(_) => Vec::new(),
        }
    }
}

/// Binary conversion label from the CRM status taxonomy.
fn conversion_label(lead: &LeadRecord) -> f64 {
    let status = lead
        .status
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    if CONVERTED_STATUSES.contains(&status.as_str()) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// In-memory store for unit tests.
    struct MemoryStore {
        blobs: StdMutex<HashMap<String, Vec<u8>>>,
        fail_saves: bool,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                blobs: StdMutex::new(HashMap::new()),
                fail_saves: false,
            }
        }

        fn failing() -> Self {
            Self {
                blobs: StdMutex::new(HashMap::new()),
                fail_saves: true,
            }
        }
    }

    #[async_trait]
    impl ArtifactStore for MemoryStore {
        async fn save(&self, key: &str, blob: &[u8]) -> Result<(), AppError> {
            if self.fail_saves {
                return Err(AppError::ArtifactStore("disk full".to_string()));
            }
            self.blobs
                .lock()
                .unwrap()
                .insert(key.to_string(), blob.to_vec());
            Ok(())
        }

        async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
            Ok(self.blobs.lock().unwrap().get(key).cloned())
        }
    }

    fn labeled_lead(source: &str, budget: Option<f64>, status: &str) -> LeadRecord {
        LeadRecord {
            email: Some("a@b.com".to_string()),
            source: Some(source.to_string()),
            budget,
            status: Some(status.to_string()),
            ..LeadRecord::default()
        }
    }

    fn training_set() -> Vec<LeadRecord> {
        let mut leads = Vec::new();
        for _ in 0..10 {
            leads.push(labeled_lead("referral", Some(150_000.0), "closed_won"));
            leads.push(labeled_lead("cold_call", None, "closed_lost"));
        }
        leads
    }

    #[test]
    fn test_scaler_handles_constant_columns() {
        let rows = vec![vec![1.0, 5.0], vec![1.0, 7.0]];
        let scaler = StandardScaler::fit(&rows);
        let out = scaler.transform(&[1.0, 6.0]);
        assert_eq!(out[0], 0.0);
        assert!(out[1].abs() < 1e-9);
    }

    #[test]
    fn test_logistic_regression_separates_labels() {
        let rows = vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.1, 0.9],
        ];
        let labels = vec![1.0, 1.0, 0.0, 0.0];
        let clf = LogisticRegression::fit(&rows, &labels);
        assert!(clf.predict_proba(&[1.0, 0.0]) > 0.5);
        assert!(clf.predict_proba(&[0.0, 1.0]) < 0.5);
    }

    #[tokio::test]
    async fn test_train_empty_set_is_explicit_error() {
        let model = ScoringModel::new(Arc::new(MemoryStore::new()), "lead_scoring");
        let err = model.train(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::NoTrainingData));
    }

    #[tokio::test]
    async fn test_train_then_predict() {
        let model = ScoringModel::new(Arc::new(MemoryStore::new()), "lead_scoring");
        let report = model.train(&training_set()).await.unwrap();
        assert!(report.accuracy >= 0.5);
        assert_eq!(report.feature_importance.len(), FEATURE_SCHEMA.len());

        let hot = extract_features(&labeled_lead("referral", Some(150_000.0), ""));
        let cold = extract_features(&labeled_lead("cold_call", None, ""));
        let p_hot = model.predict_probability(&hot).await.unwrap();
        let p_cold = model.predict_probability(&cold).await.unwrap();
        assert!(p_hot > p_cold);
        assert!((0.0..=1.0).contains(&p_hot));
    }

    #[tokio::test]
    async fn test_predict_without_artifact_is_not_found() {
        let model = ScoringModel::new(Arc::new(MemoryStore::new()), "lead_scoring");
        let features = extract_features(&LeadRecord::default());
        let err = model.predict_probability(&features).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        {
            let model = ScoringModel::new(store.clone(), "lead_scoring");
            model.train(&training_set()).await.unwrap();
        }

        // Rewrite the persisted artifact with a shortened schema
        let bytes = store.load("lead_scoring").await.unwrap().unwrap();
        let payload = ValidatedArtifactEnvelope::from_bytes_validated(&bytes).unwrap();
        let mut artifact: ModelArtifact = serde_json::from_str(&payload).unwrap();
        artifact.schema.pop();
        let envelope = ValidatedArtifactEnvelope::new(serde_json::to_string(&artifact).unwrap());
        store.save("lead_scoring", &envelope.to_bytes()).await.unwrap();

        let model = ScoringModel::new(store, "lead_scoring");
        let features = extract_features(&LeadRecord::default());
        let err = model.predict_probability(&features).await.unwrap_err();
        assert!(matches!(err, AppError::SchemaMismatch { .. }));
    }

    #[tokio::test]
    async fn test_corrupted_artifact_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        store.save("lead_scoring", b"{}garbage").await.unwrap();

        let model = ScoringModel::new(store, "lead_scoring");
        let features = extract_features(&LeadRecord::default());
        let err = model.predict_probability(&features).await.unwrap_err();
        assert!(matches!(err, AppError::ArtifactStore(_)));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_model_usable_in_memory() {
        let model = ScoringModel::new(Arc::new(MemoryStore::failing()), "lead_scoring");
        let report = model.train(&training_set()).await.unwrap();
        assert!(report.examples_total > 0);

        // The freshly trained model is still published for this process
        let features = extract_features(&labeled_lead("referral", Some(150_000.0), ""));
        assert!(model.predict_probability(&features).await.is_ok());
    }

    #[tokio::test]
    async fn test_training_is_deterministic() {
        let leads = training_set();
        let model_a = ScoringModel::new(Arc::new(MemoryStore::new()), "a");
        let model_b = ScoringModel::new(Arc::new(MemoryStore::new()), "b");
        let report_a = model_a.train(&leads).await.unwrap();
        let report_b = model_b.train(&leads).await.unwrap();

        assert_eq!(report_a.accuracy, report_b.accuracy);
        assert_eq!(report_a.feature_importance, report_b.feature_importance);
    }
}
