use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::ClassifierOptions;

/// One predicted class with its confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    /// Confidence between 0.0 and 1.0
    pub score: f32,
}

impl Category {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// The outcome of a successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classifications {
    /// Categories ranked by descending score, never empty
    pub categories: Vec<Category>,
    /// Wall-clock time spent decoding and classifying, in milliseconds
    pub inference_time_ms: u64,
}

impl Classifications {
    /// The highest-scoring category.
    pub fn top(&self) -> Option<&Category> {
        self.categories.first()
    }
}

/// Ranks raw scores the way the classifier reports them.
///
/// Drops NaN scores and scores below `options.score_threshold`, sorts by
/// descending score (ties keep model order) and keeps at most
/// `options.max_results` entries.
///
/// # Example
/// ```
/// use asclepius::{rank_scores, Category, ClassifierConfig};
///
/// let options = ClassifierConfig::default().options().unwrap();
/// let ranked = rank_scores(
///     vec![
///         Category::new("benign", 0.15),
///         Category::new("malignant", 0.82),
///         Category::new("other", 0.02),
///     ],
///     &options,
/// );
/// assert_eq!(ranked, vec![Category::new("malignant", 0.82), Category::new("benign", 0.15)]);
/// ```
pub fn rank_scores(raw: Vec<Category>, options: &ClassifierOptions) -> Vec<Category> {
    let mut ranked: Vec<Category> = raw
        .into_iter()
        .filter(|c| !c.score.is_nan() && c.score >= options.score_threshold)
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(options.max_results);
    ranked
}
