//! The message handed to the screen that displays a classification.

use serde::{Deserialize, Serialize};

use crate::classifier::{Category, Classifications};

/// Key under which the chosen image URI travels.
pub const EXTRA_IMAGE_URI: &str = "extra_image_uri";
/// Key under which the formatted result travels.
pub const EXTRA_RESULT: &str = "extra_result";

/// Formats a category as `"<label> <NN%>"`.
pub fn format_category(category: &Category) -> String {
    format!("{} {:.0}%", category.label, category.score * 100.0)
}

/// Formats the top prediction, or `None` when there is none.
pub fn format_result(results: &Classifications) -> Option<String> {
    results.top().map(format_category)
}

/// Image URI and result text, displayed verbatim by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(rename = "extra_image_uri")]
    pub image_uri: String,
    #[serde(rename = "extra_result")]
    pub result: String,
}

impl ResultMessage {
    pub fn new(image_uri: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            image_uri: image_uri.into(),
            result: result.into(),
        }
    }

    /// Builds the message for the top prediction of `results`.
    pub fn from_classifications(
        image_uri: impl Into<String>,
        results: &Classifications,
    ) -> Option<Self> {
        format_result(results).map(|result| Self::new(image_uri, result))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
