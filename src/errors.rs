use std::fmt;

/// Application-specific error types.
///
/// Every failure class gets its own variant so that callers (most importantly
/// the fallback-selection logic in the scoring and sentiment engines) can
/// branch on the kind of failure instead of a sentinel value.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Training was requested with an empty example set.
    NoTrainingData,
    /// A persisted artifact was recorded with a different feature schema than
    /// the current extractor produces.
    SchemaMismatch {
        /// Schema the current extractor produces.
        expected: Vec<String>,
        /// Schema recorded in the persisted artifact.
        found: Vec<String>,
    },
    /// Resource not found error.
    NotFound(String),
    /// Error reading or writing a persisted artifact.
    ArtifactStore(String),
    /// The external text-classification capability failed, timed out, is
    /// circuit-broken, or was never configured.
    ClassifierUnavailable(String),
    /// Internal error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoTrainingData => write!(f, "No training data provided"),
            AppError::SchemaMismatch { expected, found } => write!(
                f,
                "Feature schema mismatch: artifact has {} features, extractor has {}",
                found.len(),
                expected.len()
            ),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ArtifactStore(msg) => write!(f, "Artifact store error: {}", msg),
            AppError::ClassifierUnavailable(msg) => {
                write!(f, "Classifier unavailable: {}", msg)
            }
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::ClassifierUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    /// Converts a filesystem error into an `AppError`.
    fn from(err: std::io::Error) -> Self {
        AppError::ArtifactStore(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    /// Converts a serialization error into an `AppError`.
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("Serialization error: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    #[allow(dead_code)]
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
