use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use super::backend::{ClassifierHandle, ModelRuntime};
use super::error::{ClassificationError, ClassifierError, SetupError};
use super::image_source::load_image;
use super::model::{Category, Classifications};
use crate::cache::{AssetStore, ModelCache};
use crate::config::ClassifierConfig;

/// Receives the outcome of setup and classification.
///
/// For every `classify` call exactly one of the two methods is invoked.
pub trait ClassifierListener {
    /// Called with a fixed, human readable message.
    fn on_error(&self, message: &str);
    /// Called with the ranked categories and the time spent in milliseconds.
    fn on_results(&self, results: &[Category], inference_time_ms: u64);
}

/// Lifecycle of the helper's classifier handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperState {
    /// Setup has not been attempted yet
    Uninitialized,
    /// A live handle exists
    Ready,
    /// The last setup attempt failed; the next `classify` tries again
    Failed,
}

/// Owns one classifier handle and classifies static images with it.
///
/// The helper copies the bundled model into the cache on first use, builds
/// the handle through its [`ModelRuntime`], and rebuilds the handle on the
/// next `classify` call if setup failed earlier. Everything runs on the
/// calling thread.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use asclepius::{
///     ClassifierConfig, DirAssetStore, ImageClassifierHelper, ModelCache, OnnxRuntime,
/// };
///
/// let mut helper = ImageClassifierHelper::new(
///     ClassifierConfig::default().with_label_asset("labels.txt"),
///     ModelCache::new_default()?,
///     DirAssetStore::new("assets"),
///     OnnxRuntime::new(),
///     None,
/// );
///
/// let results = helper.classify("scan.jpg")?;
/// println!("{:?} in {} ms", results.top(), results.inference_time_ms);
/// # Ok(())
/// # }
/// ```
pub struct ImageClassifierHelper<R: ModelRuntime> {
    config: ClassifierConfig,
    cache: ModelCache,
    assets: Box<dyn AssetStore>,
    runtime: R,
    listener: Option<Arc<dyn ClassifierListener>>,
    handle: Option<R::Handle>,
    state: HelperState,
}

impl<R: ModelRuntime> ImageClassifierHelper<R> {
    /// Creates the helper and sets the classifier up immediately.
    ///
    /// Construction never fails: a setup failure is reported through the
    /// listener and the helper is left in [`HelperState::Failed`].
    pub fn new(
        config: ClassifierConfig,
        cache: ModelCache,
        assets: impl AssetStore + 'static,
        runtime: R,
        listener: Option<Arc<dyn ClassifierListener>>,
    ) -> Self {
        let mut helper = Self::new_lazy(config, cache, assets, runtime, listener);
        // Already reported to the listener
        let _ = helper.ensure_classifier_ready();
        helper
    }

    /// Creates the helper without touching the model; setup happens on the
    /// first `classify` call.
    pub fn new_lazy(
        config: ClassifierConfig,
        cache: ModelCache,
        assets: impl AssetStore + 'static,
        runtime: R,
        listener: Option<Arc<dyn ClassifierListener>>,
    ) -> Self {
        Self {
            config,
            cache,
            assets: Box::new(assets),
            runtime,
            listener,
            handle: None,
            state: HelperState::Uninitialized,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn state(&self) -> HelperState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.handle.is_some()
    }

    /// Path of the cached model artifact.
    pub fn model_path(&self) -> PathBuf {
        self.cache.cached_path(&self.config.model_asset_name)
    }

    /// Makes sure a live classifier handle exists.
    ///
    /// Does nothing when the helper is already ready. On failure the
    /// listener receives the setup error message.
    pub fn ensure_classifier_ready(&mut self) -> Result<(), ClassifierError> {
        self.try_setup().map_err(|e| {
            let err = ClassifierError::from(e);
            self.notify_error(&err);
            err
        })
    }

    /// Classifies the image behind `image_uri`.
    ///
    /// Reports the outcome through the listener exactly once and returns it.
    pub fn classify(&mut self, image_uri: &str) -> Result<Classifications, ClassifierError> {
        match self.classify_inner(image_uri) {
            Ok(results) => {
                debug!(
                    "Classified {} in {} ms: {:?}",
                    image_uri, results.inference_time_ms, results.categories
                );
                if let Some(listener) = &self.listener {
                    listener.on_results(&results.categories, results.inference_time_ms);
                }
                Ok(results)
            }
            Err(err) => {
                self.notify_error(&err);
                Err(err)
            }
        }
    }

    /// Removes the cached model artifact and drops the live handle. The
    /// next setup copies the bundled asset again.
    pub fn clear_cache(&mut self) -> Result<(), ClassifierError> {
        self.handle = None;
        self.state = HelperState::Uninitialized;
        self.cache
            .remove(&self.config.model_asset_name)
            .map_err(SetupError::from)?;
        if let Some(labels) = &self.config.label_asset_name {
            self.cache.remove(labels).map_err(SetupError::from)?;
        }
        Ok(())
    }

    fn classify_inner(&mut self, image_uri: &str) -> Result<Classifications, ClassifierError> {
        if self.handle.is_none() {
            info!("Classifier not ready, running setup again");
            self.try_setup()?;
        }

        let start = Instant::now();

        let image = load_image(image_uri)?;
        let handle = self.handle.as_mut().ok_or(ClassificationError::NotReady)?;
        let categories = handle.classify(&image).map_err(ClassificationError::from)?;

        let inference_time_ms = start.elapsed().as_millis() as u64;

        if categories.is_empty() {
            return Err(ClassificationError::NoResults.into());
        }

        Ok(Classifications {
            categories,
            inference_time_ms,
        })
    }

    fn try_setup(&mut self) -> Result<(), SetupError> {
        if self.handle.is_some() {
            return Ok(());
        }

        match self.build_handle() {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = HelperState::Ready;
                info!("Image classifier ready ({})", self.config.model_asset_name);
                Ok(())
            }
            Err(e) => {
                self.state = HelperState::Failed;
                warn!("Image classifier setup failed: {}", e);
                Err(e)
            }
        }
    }

    fn build_handle(&self) -> Result<R::Handle, SetupError> {
        let options = self.config.options()?;

        let model_path = self.cache.ensure_cached(
            self.assets.as_ref(),
            &self.config.model_asset_name,
            self.config.model_sha256.as_deref(),
        )?;

        let labels_path = match &self.config.label_asset_name {
            Some(name) => Some(self.cache.ensure_cached(self.assets.as_ref(), name, None)?),
            None => None,
        };

        self.runtime
            .create_from_file(&model_path, labels_path.as_deref(), &options)
            .map_err(|source| SetupError::Runtime {
                path: model_path,
                source,
            })
    }

    fn notify_error(&self, err: &ClassifierError) {
        error!("{}", err);
        if let Some(listener) = &self.listener {
            listener.on_error(err.user_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::backend::RuntimeError;
    use crate::config::ClassifierOptions;
    use image::DynamicImage;
    use std::io::{self, Read};
    use std::path::Path;
    use tempfile::TempDir;

    struct EmptyAssets;

    impl AssetStore for EmptyAssets {
        fn open(&self, _name: &str) -> io::Result<Box<dyn Read>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no assets"))
        }
    }

    struct NeverRuntime;

    struct NeverHandle;

    impl ClassifierHandle for NeverHandle {
        fn classify(&mut self, _image: &DynamicImage) -> Result<Vec<Category>, RuntimeError> {
            Ok(Vec::new())
        }
    }

    impl ModelRuntime for NeverRuntime {
        type Handle = NeverHandle;

        fn create_from_file(
            &self,
            _model_path: &Path,
            _labels_path: Option<&Path>,
            _options: &ClassifierOptions,
        ) -> Result<NeverHandle, RuntimeError> {
            Ok(NeverHandle)
        }
    }

    #[test]
    fn test_lazy_helper_starts_uninitialized() {
        let dir = TempDir::new().unwrap();
        let helper = ImageClassifierHelper::new_lazy(
            ClassifierConfig::default(),
            ModelCache::new(dir.path()).unwrap(),
            EmptyAssets,
            NeverRuntime,
            None,
        );
        assert_eq!(helper.state(), HelperState::Uninitialized);
        assert!(!helper.is_ready());
    }

    #[test]
    fn test_missing_asset_fails_without_panicking() {
        let dir = TempDir::new().unwrap();
        let mut helper = ImageClassifierHelper::new(
            ClassifierConfig::default(),
            ModelCache::new(dir.path()).unwrap(),
            EmptyAssets,
            NeverRuntime,
            None,
        );
        assert_eq!(helper.state(), HelperState::Failed);

        let err = helper.classify("missing.png").unwrap_err();
        assert!(matches!(err, ClassifierError::Setup(SetupError::AssetMissing(_))));
        assert!(!helper.model_path().exists());
    }
}
