use std::collections::HashMap;
use std::path::Path;

use image::DynamicImage;
use log::{debug, info};
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::backend::{read_labels, ClassifierHandle, ModelRuntime, RuntimeError};
use super::model::{rank_scores, Category};
use super::tensor::Preprocessing;
use super::utils::{sigmoid, softmax};
use crate::config::ClassifierOptions;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Builds [`OnnxClassifier`] handles with ONNX Runtime.
///
/// The model is expected to:
/// - take a single float image tensor of shape `[batch, 3, height, width]`
/// - produce one score per class as its first output
///
/// When height and width are dynamic, the preprocessing size is used.
/// Scores are reported as the model produced them unless an
/// [`OutputActivation`] is configured.
#[derive(Debug, Clone, Default)]
pub struct OnnxRuntime {
    preprocessing: Preprocessing,
    activation: OutputActivation,
}

/// Activation applied to the model's raw output before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputActivation {
    /// The model already outputs confidences
    #[default]
    None,
    /// Single-label logits, normalised across classes
    Softmax,
    /// Independent per-class logits
    Sigmoid,
}

impl OnnxRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the per-channel normalisation applied to input pixels.
    pub fn with_normalization(mut self, mean: [f32; 3], std: [f32; 3]) -> Self {
        self.preprocessing = self.preprocessing.with_normalization(mean, std);
        self
    }

    /// Sets the activation applied to raw model outputs.
    pub fn with_output_activation(mut self, activation: OutputActivation) -> Self {
        self.activation = activation;
        self
    }

    /// Sets the input size used for models with dynamic spatial dimensions.
    pub fn with_default_size(mut self, width: u32, height: u32) -> Self {
        self.preprocessing = self.preprocessing.with_size(width, height);
        self
    }
}

impl ModelRuntime for OnnxRuntime {
    type Handle = OnnxClassifier;

    fn create_from_file(
        &self,
        model_path: &Path,
        labels_path: Option<&Path>,
        options: &ClassifierOptions,
    ) -> Result<OnnxClassifier, RuntimeError> {
        if !model_path.is_file() {
            return Err(RuntimeError::Model(format!(
                "model file not found: {:?}",
                model_path
            )));
        }

        let session = create_session_builder(&RuntimeConfig::from(options))?
            .commit_from_file(model_path)?;

        let (input_name, preprocessing) = Self::validate_model(&session, &self.preprocessing)?;
        info!(
            "Model loaded from {:?} (input '{}', {}x{})",
            model_path, input_name, preprocessing.width, preprocessing.height
        );

        let labels = labels_path.map(read_labels).transpose()?;
        if let Some(labels) = &labels {
            debug!("Loaded {} labels", labels.len());
        }

        Ok(OnnxClassifier {
            session,
            input_name,
            preprocessing,
            labels,
            options: *options,
            activation: self.activation,
        })
    }
}

impl OnnxRuntime {
    /// Checks the model has an NCHW image input and at least one output,
    /// and resolves the input name and spatial size.
    fn validate_model(
        session: &Session,
        defaults: &Preprocessing,
    ) -> Result<(String, Preprocessing), RuntimeError> {
        let input = session
            .inputs
            .first()
            .ok_or_else(|| RuntimeError::Model("model has no inputs".into()))?;

        if session.outputs.is_empty() {
            return Err(RuntimeError::Model("model must have at least 1 output".into()));
        }

        let dimensions = match &input.input_type {
            ValueType::Tensor { dimensions, .. } => dimensions,
            other => {
                return Err(RuntimeError::Model(format!(
                    "input '{}' must be a tensor, found {:?}",
                    input.name, other
                )))
            }
        };

        let preprocessing = input_preprocessing(&input.name, dimensions, defaults)?;
        Ok((input.name.clone(), preprocessing))
    }
}

/// Resolves the preprocessing for an NCHW input with the given dimensions.
///
/// Dynamic dimensions are negative; dynamic height or width keep the
/// default size.
fn input_preprocessing(
    name: &str,
    dimensions: &[i64],
    defaults: &Preprocessing,
) -> Result<Preprocessing, RuntimeError> {
    if dimensions.len() != 4 {
        return Err(RuntimeError::Model(format!(
            "input '{}' must have 4 dimensions (NCHW), found {:?}",
            name, dimensions
        )));
    }
    if dimensions[1] > 0 && dimensions[1] != 3 {
        return Err(RuntimeError::Model(format!(
            "input '{}' must have 3 channels, found {}",
            name, dimensions[1]
        )));
    }

    let mut preprocessing = defaults.clone();
    if dimensions[2] > 0 && dimensions[3] > 0 {
        preprocessing = preprocessing.with_size(dimensions[3] as u32, dimensions[2] as u32);
    }
    Ok(preprocessing)
}

/// Turns one image's raw output into ranked categories.
///
/// Labels, when given, must match the number of scores; otherwise the class
/// index is used as the label.
fn scores_to_categories(
    scores: Vec<f32>,
    labels: Option<&[String]>,
    options: &ClassifierOptions,
    activation: OutputActivation,
) -> Result<Vec<Category>, RuntimeError> {
    if let Some(labels) = labels {
        if labels.len() != scores.len() {
            return Err(RuntimeError::Model(format!(
                "model produced {} scores but {} labels are configured",
                scores.len(),
                labels.len()
            )));
        }
    }

    let scores = match activation {
        OutputActivation::None => scores,
        OutputActivation::Softmax if scores.len() < 2 => {
            return Err(RuntimeError::Model(format!(
                "softmax needs at least 2 scores, model produced {}",
                scores.len()
            )))
        }
        OutputActivation::Softmax => softmax(&scores),
        OutputActivation::Sigmoid => sigmoid(&scores),
    };

    let raw = scores
        .into_iter()
        .enumerate()
        .map(|(i, score)| {
            let label = labels
                .and_then(|labels| labels.get(i).cloned())
                .unwrap_or_else(|| i.to_string());
            Category::new(label, score)
        })
        .collect();

    Ok(rank_scores(raw, options))
}

/// A classifier handle backed by an ONNX Runtime session.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    preprocessing: Preprocessing,
    labels: Option<Vec<String>>,
    options: ClassifierOptions,
    activation: OutputActivation,
}

impl OnnxClassifier {
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    fn run(&self, image: &DynamicImage) -> Result<Vec<f32>, RuntimeError> {
        let tensor = self.preprocessing.to_tensor(image)?;

        let mut inputs = HashMap::new();
        inputs.insert(self.input_name.as_str(), Tensor::from_array(tensor)?);

        let outputs = self.session.run(inputs)?;
        let scores = outputs[0].try_extract_tensor::<f32>()?;
        Ok(scores.iter().copied().collect())
    }
}

impl ClassifierHandle for OnnxClassifier {
    fn classify(&mut self, image: &DynamicImage) -> Result<Vec<Category>, RuntimeError> {
        let scores = self.run(image)?;
        scores_to_categories(scores, self.labels.as_deref(), &self.options, self.activation)
    }
}
