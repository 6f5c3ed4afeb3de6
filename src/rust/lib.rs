//! Image classification with a pretrained ONNX model, wrapped in a small
//! helper that owns the model's lifecycle.
//!
//! The helper copies the bundled model artifact into a local cache once,
//! builds a classifier from the cached file, and classifies one static
//! image per call. Every call reports exactly one outcome, both as the
//! returned `Result` and through an optional [`ClassifierListener`].
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use asclepius::{
//!     ClassifierConfig, DirAssetStore, ImageClassifierHelper, ModelCache, OnnxRuntime,
//!     ResultMessage,
//! };
//!
//! let config = ClassifierConfig::new("cancer_classification.onnx")
//!     .with_label_asset("labels.txt");
//!
//! let mut helper = ImageClassifierHelper::new(
//!     config,
//!     ModelCache::new_default()?,
//!     DirAssetStore::new("assets"),
//!     OnnxRuntime::new(),
//!     None,
//! );
//!
//! let results = helper.classify("file:///tmp/scan.jpg")?;
//! if let Some(message) = ResultMessage::from_classifications("file:///tmp/scan.jpg", &results) {
//!     println!("{}", message.result);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Listeners
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use asclepius::{
//!     Category, ClassifierConfig, ClassifierListener, DirAssetStore, ImageClassifierHelper,
//!     ModelCache, OnnxRuntime,
//! };
//!
//! struct Printer;
//!
//! impl ClassifierListener for Printer {
//!     fn on_error(&self, message: &str) {
//!         eprintln!("{}", message);
//!     }
//!
//!     fn on_results(&self, results: &[Category], inference_time_ms: u64) {
//!         println!("{:?} ({} ms)", results, inference_time_ms);
//!     }
//! }
//!
//! let mut helper = ImageClassifierHelper::new(
//!     ClassifierConfig::default(),
//!     ModelCache::new_default()?,
//!     DirAssetStore::new("assets"),
//!     OnnxRuntime::new(),
//!     Some(Arc::new(Printer)),
//! );
//! let _ = helper.classify("scan.jpg");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod classifier;
pub mod config;
pub mod presenter;
mod runtime;

pub use cache::{AssetStore, CacheError, DirAssetStore, ModelCache};
pub use classifier::{
    rank_scores, Category, ClassificationError, Classifications, ClassifierError,
    ClassifierHandle, ClassifierListener, HelperState, ImageClassifierHelper, ModelRuntime,
    OnnxClassifier, OnnxRuntime, OutputActivation, Preprocessing, RuntimeError, SetupError,
};
pub use config::{ClassifierConfig, ClassifierOptions};
pub use presenter::{format_result, ResultMessage};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
