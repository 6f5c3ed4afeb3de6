use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::sync::OnceLock;

use crate::classifier::RuntimeError;
use crate::config::ClassifierOptions;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Graph optimisation applied when a session is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    #[default]
    All,
}

impl From<OptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OptimizationLevel) -> Self {
        match level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
            OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
            OptimizationLevel::All => GraphOptimizationLevel::Level3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 0, // Let ONNX Runtime decide
            optimization_level: OptimizationLevel::All,
        }
    }
}

impl From<&ClassifierOptions> for RuntimeConfig {
    fn from(options: &ClassifierOptions) -> Self {
        Self {
            intra_threads: options.num_threads,
            ..Self::default()
        }
    }
}

fn init_onnx_environment() -> Result<(), String> {
    ort::init()
        .with_name("asclepius")
        .commit()
        .map_err(|e| e.to_string())?;
    log::debug!("ONNX Runtime environment initialized");
    Ok(())
}

/// Initialises the process-wide ONNX Runtime environment once.
///
/// A failed initialisation is remembered and reported on every later call.
pub fn ensure_initialized() -> Result<(), RuntimeError> {
    INIT.get_or_init(init_onnx_environment)
        .clone()
        .map_err(RuntimeError::Environment)
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, RuntimeError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(config.optimization_level.into())?;

    Ok(builder)
}
