mod backend;
mod error;
mod helper;
mod image_source;
mod model;
mod onnx;
mod tensor;
mod utils;

pub use backend::{read_labels, ClassifierHandle, ModelRuntime, RuntimeError};
pub use error::{
    ClassificationError, ClassifierError, SetupError, CLASSIFICATION_FAILED_MESSAGE,
    SETUP_FAILED_MESSAGE,
};
pub use helper::{ClassifierListener, HelperState, ImageClassifierHelper};
pub use image_source::{load_image, resolve_uri};
pub use model::{rank_scores, Category, Classifications};
pub use onnx::{OnnxClassifier, OnnxRuntime, OutputActivation};
pub use tensor::{Preprocessing, DEFAULT_INPUT_SIZE, IMAGENET_MEAN, IMAGENET_STD};
