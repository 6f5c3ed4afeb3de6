use serde::{Deserialize, Serialize};

use crate::classifier::SetupError;

/// Number of threads handed to the inference runtime.
pub const NUM_THREADS: usize = 4;

pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.1;
pub const DEFAULT_MAX_RESULTS: usize = 3;
pub const DEFAULT_MODEL_ASSET: &str = "cancer_classification.onnx";

/// Settings for an [`ImageClassifierHelper`](crate::ImageClassifierHelper).
///
/// Supplied once when the helper is created and never changed afterwards.
///
/// # Example
/// ```
/// use asclepius::ClassifierConfig;
///
/// let config = ClassifierConfig::default()
///     .with_score_threshold(0.25)
///     .with_max_results(1)
///     .with_label_asset("labels.txt");
/// assert_eq!(config.num_threads(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum score for a category to be reported
    pub score_threshold: f32,
    /// Maximum number of categories reported per image
    pub max_results: usize,
    /// Name of the bundled model artifact, also its name in the cache
    pub model_asset_name: String,
    /// Optional bundled labels file, one label per line in output order
    pub label_asset_name: Option<String>,
    /// Optional SHA-256 (hex) the cached model must match
    pub model_sha256: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            model_asset_name: DEFAULT_MODEL_ASSET.to_string(),
            label_asset_name: None,
            model_sha256: None,
        }
    }
}

impl ClassifierConfig {
    pub fn new(model_asset_name: impl Into<String>) -> Self {
        Self {
            model_asset_name: model_asset_name.into(),
            ..Self::default()
        }
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_label_asset(mut self, name: impl Into<String>) -> Self {
        self.label_asset_name = Some(name.into());
        self
    }

    pub fn with_model_sha256(mut self, hash: impl Into<String>) -> Self {
        self.model_sha256 = Some(hash.into());
        self
    }

    pub fn num_threads(&self) -> usize {
        NUM_THREADS
    }

    /// Builds the runtime options, rejecting values the runtime cannot honour.
    pub fn options(&self) -> Result<ClassifierOptions, SetupError> {
        if !self.score_threshold.is_finite() || !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(SetupError::InvalidOptions(format!(
                "score threshold must be within [0, 1], got {}",
                self.score_threshold
            )));
        }
        if self.max_results == 0 {
            return Err(SetupError::InvalidOptions("max results must be at least 1".into()));
        }
        if self.model_asset_name.is_empty() {
            return Err(SetupError::InvalidOptions("model asset name cannot be empty".into()));
        }
        Ok(ClassifierOptions {
            score_threshold: self.score_threshold,
            max_results: self.max_results,
            num_threads: NUM_THREADS,
        })
    }
}

/// Options passed to the runtime when a classifier handle is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOptions {
    pub score_threshold: f32,
    pub max_results: usize,
    pub num_threads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.score_threshold, 0.1);
        assert_eq!(config.max_results, 3);
        assert_eq!(config.model_asset_name, "cancer_classification.onnx");
        assert_eq!(config.num_threads(), 4);
    }

    #[test]
    fn test_options_from_config() {
        let options = ClassifierConfig::new("model.onnx")
            .with_score_threshold(0.5)
            .with_max_results(5)
            .options()
            .unwrap();
        assert_eq!(options.score_threshold, 0.5);
        assert_eq!(options.max_results, 5);
        assert_eq!(options.num_threads, NUM_THREADS);
    }

    #[test]
    fn test_invalid_options() {
        let config = ClassifierConfig::default();
        assert!(config.clone().with_score_threshold(1.5).options().is_err());
        assert!(config.clone().with_score_threshold(f32::NAN).options().is_err());
        assert!(config.clone().with_max_results(0).options().is_err());
        assert!(matches!(
            ClassifierConfig::new("").options(),
            Err(SetupError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{"max_results": 1, "label_asset_name": "labels.txt"}"#;
        let config: ClassifierConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_results, 1);
        assert_eq!(config.score_threshold, DEFAULT_SCORE_THRESHOLD);
        assert_eq!(config.label_asset_name.as_deref(), Some("labels.txt"));
    }
}
