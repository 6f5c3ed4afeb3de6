use std::path::PathBuf;

use crate::cache::CacheError;
use super::backend::RuntimeError;

/// Message handed to the listener when the classifier cannot be initialised.
pub const SETUP_FAILED_MESSAGE: &str = "Image classifier failed to initialize";

/// Message handed to the listener when a single image could not be classified.
pub const CLASSIFICATION_FAILED_MESSAGE: &str = "Image classification failed";

/// Represents the two kinds of failure the image classifier can report.
///
/// The `Display` output carries diagnostic detail meant for logs. Callers that
/// show something to an end user should use [`ClassifierError::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The model artifact or runtime could not be prepared
    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),
    /// A single image could not be classified
    #[error("Classification failed: {0}")]
    Classification(#[from] ClassificationError),
}

impl ClassifierError {
    /// Returns the fixed, human readable message for this kind of failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Setup(_) => SETUP_FAILED_MESSAGE,
            Self::Classification(_) => CLASSIFICATION_FAILED_MESSAGE,
        }
    }

    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}

/// Failures while preparing the classifier handle.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Unsupported classifier options: {0}")]
    InvalidOptions(String),
    #[error("Bundled asset '{0}' not found")]
    AssetMissing(String),
    #[error("Error copying model file '{name}': {source}")]
    AssetCopy {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Cached artifact '{name}' failed verification: expected {expected}, got {actual}")]
    Integrity {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("Failed to create classifier from {path:?}: {source}")]
    Runtime {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },
}

impl From<CacheError> for SetupError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::AssetMissing(name) => SetupError::AssetMissing(name),
            CacheError::Copy { name, source } => SetupError::AssetCopy { name, source },
            CacheError::HashMismatch { name, expected, actual } => {
                SetupError::Integrity { name, expected, actual }
            }
            CacheError::Io(e) => SetupError::CacheDir(e),
        }
    }
}

/// Failures while classifying one image.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("Classifier is not initialized")]
    NotReady,
    #[error("Unsupported image URI '{0}'")]
    UnsupportedUri(String),
    #[error("Failed to read image '{uri}': {source}")]
    ImageRead {
        uri: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image '{uri}': {source}")]
    ImageDecode {
        uri: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Inference failed: {0}")]
    Inference(#[from] RuntimeError),
    #[error("Model returned no classification above the score threshold")]
    NoResults,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_fixed() {
        let setup: ClassifierError = SetupError::AssetMissing("model.onnx".into()).into();
        let classify: ClassifierError = ClassificationError::NoResults.into();

        assert_eq!(setup.user_message(), SETUP_FAILED_MESSAGE);
        assert_eq!(classify.user_message(), CLASSIFICATION_FAILED_MESSAGE);
        assert!(setup.is_setup());
        assert!(!classify.is_setup());
    }

    #[test]
    fn test_display_keeps_diagnostics() {
        let err: ClassifierError = SetupError::AssetMissing("model.onnx".into()).into();
        assert!(err.to_string().contains("model.onnx"));
    }

    #[test]
    fn test_cache_error_mapping() {
        let err: SetupError = CacheError::AssetMissing("labels.txt".into()).into();
        assert!(matches!(err, SetupError::AssetMissing(name) if name == "labels.txt"));
    }
}
