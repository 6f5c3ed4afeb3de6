use std::fs;
use std::path::Path;

use image::DynamicImage;

use super::model::Category;
use crate::config::ClassifierOptions;

/// Errors raised by an inference runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The process-wide runtime environment could not be initialised
    #[error("Runtime environment error: {0}")]
    Environment(String),
    /// Error reported by ONNX Runtime
    #[error(transparent)]
    Ort(#[from] ort::Error),
    /// The model file is readable but unusable
    #[error("Model error: {0}")]
    Model(String),
    /// The input could not be converted into the model's tensor format
    #[error("Input error: {0}")]
    Input(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds classifier handles from a cached model file.
///
/// This is the seam between the helper's lifecycle and the actual
/// inference engine. [`OnnxRuntime`](super::OnnxRuntime) is the production
/// implementation.
pub trait ModelRuntime {
    type Handle: ClassifierHandle;

    /// Creates a handle for the model at `model_path`.
    ///
    /// `labels_path` points to a cached labels file when one is configured.
    fn create_from_file(
        &self,
        model_path: &Path,
        labels_path: Option<&Path>,
        options: &ClassifierOptions,
    ) -> Result<Self::Handle, RuntimeError>;
}

/// An initialised model capable of classifying one image at a time.
pub trait ClassifierHandle {
    /// Classifies `image` synchronously on the calling thread.
    ///
    /// Returns the categories ranked by descending score, filtered and
    /// truncated according to the options the handle was built with.
    fn classify(&mut self, image: &DynamicImage) -> Result<Vec<Category>, RuntimeError>;
}

/// Reads a labels file, one label per line. Blank lines are skipped.
pub fn read_labels(path: &Path) -> Result<Vec<String>, RuntimeError> {
    let contents = fs::read_to_string(path)?;
    let labels: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if labels.is_empty() {
        return Err(RuntimeError::Model(format!("labels file {:?} is empty", path)));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_labels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "Cancer\n\n  Non Cancer  \n").unwrap();

        let labels = read_labels(&path).unwrap();
        assert_eq!(labels, vec!["Cancer", "Non Cancer"]);
    }

    #[test]
    fn test_empty_labels_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "\n\n").unwrap();
        assert!(matches!(read_labels(&path), Err(RuntimeError::Model(_))));
    }
}
