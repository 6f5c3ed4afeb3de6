use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use asclepius::{
    Category, ClassifierConfig, ClassifierListener, DirAssetStore, ImageClassifierHelper,
    ModelCache, OnnxRuntime, OutputActivation, ResultMessage,
};
use clap::{Parser, ValueEnum};
use log::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to classify (path or file:// URI)
    image: String,

    /// Directory holding the bundled model assets
    #[arg(short, long, default_value = "assets")]
    assets: PathBuf,

    /// Model asset name
    #[arg(short, long, default_value = asclepius::config::DEFAULT_MODEL_ASSET)]
    model: String,

    /// Labels asset name, one label per line
    #[arg(short, long)]
    labels: Option<String>,

    /// Minimum score for a category to be reported
    #[arg(short, long, default_value_t = asclepius::config::DEFAULT_SCORE_THRESHOLD)]
    threshold: f32,

    /// Maximum number of categories reported
    #[arg(long, default_value_t = asclepius::config::DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Cache directory (defaults to $ASCLEPIUS_CACHE or the platform cache dir)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Expected SHA-256 of the model artifact
    #[arg(long)]
    sha256: Option<String>,

    /// Remove the cached model before classifying
    #[arg(short, long)]
    fresh: bool,

    /// Activation applied to the model's raw scores
    #[arg(long, value_enum, default_value_t = Activation::None)]
    activation: Activation,

    /// Print the result message as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Activation {
    None,
    Softmax,
    Sigmoid,
}

impl From<Activation> for OutputActivation {
    fn from(activation: Activation) -> Self {
        match activation {
            Activation::None => OutputActivation::None,
            Activation::Softmax => OutputActivation::Softmax,
            Activation::Sigmoid => OutputActivation::Sigmoid,
        }
    }
}

struct LogListener;

impl ClassifierListener for LogListener {
    fn on_error(&self, message: &str) {
        error!("{}", message);
    }

    fn on_results(&self, results: &[Category], inference_time_ms: u64) {
        info!("{} categories in {} ms", results.len(), inference_time_ms);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = ClassifierConfig::new(&args.model)
        .with_score_threshold(args.threshold)
        .with_max_results(args.max_results);
    if let Some(labels) = &args.labels {
        config = config.with_label_asset(labels);
    }
    if let Some(hash) = &args.sha256 {
        config = config.with_model_sha256(hash);
    }

    let cache = match &args.cache_dir {
        Some(dir) => ModelCache::new(dir),
        None => ModelCache::new_default(),
    }
    .context("Failed to create model cache directory")?;
    info!("Using model cache at {:?}", cache.root());

    let mut helper = ImageClassifierHelper::new_lazy(
        config,
        cache,
        DirAssetStore::new(&args.assets),
        OnnxRuntime::new().with_output_activation(args.activation.into()),
        Some(Arc::new(LogListener)),
    );

    if args.fresh {
        info!("Fresh copy requested - removing cached model files...");
        if let Err(e) = helper.clear_cache() {
            bail!("Failed to clear model cache: {}", e);
        }
    }

    let results = match helper.classify(&args.image) {
        Ok(results) => results,
        Err(e) => bail!("{}: {}", e.user_message(), e),
    };

    if args.json {
        let Some(message) = ResultMessage::from_classifications(&args.image, &results) else {
            bail!("No categories to report");
        };
        println!("{}", message.to_json()?);
        return Ok(());
    }

    println!("\nResults for {}:", args.image);
    for category in &results.categories {
        println!("  {}: {:.1}%", category.label, category.score * 100.0);
    }
    println!("Inference time: {} ms", results.inference_time_ms);

    Ok(())
}
