mod linear;

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{error, info};
use serde::Serialize;

pub use linear::LinearTextClassifier;

#[cfg(test)]
pub(crate) mod fixtures {
    /// "this is fake" scores Fake, "official report" scores Real.
    pub const SAMPLE_ARTIFACT: &str = r#"{
        "vectorizer": {
            "vocabulary": {"fake": 0, "news": 1, "hoax": 2, "report": 3, "official": 4},
            "idf": [1.5, 1.0, 2.0, 1.2, 1.8],
            "stop_words": ["this", "is", "the"]
        },
        "coef": [2.0, 0.1, 3.0, -1.5, -2.0],
        "intercept": -0.2,
        "classes": [0, 1]
    }"#;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Fake,
    Real,
}

impl Label {
    /// Non-zero raw predictions mean fake news.
    pub fn from_raw(raw: i64) -> Self {
        if raw != 0 {
            Label::Fake
        } else {
            Label::Real
        }
    }
}

/// A trained binary text classifier.
pub trait Classifier: Send + Sync {
    /// Raw class value for every input text, in order.
    fn predict(&self, batch: &[String]) -> Result<Vec<i64>>;

    fn classify(&self, text: &str) -> Result<Label> {
        let raw = self.predict(&[text.to_string()])?;
        raw.first()
            .copied()
            .map(Label::from_raw)
            .ok_or_else(|| anyhow!("classifier returned no result"))
    }
}

/// Reads the artifact at `path` once. Never fails: a missing or unreadable
/// artifact is logged and yields `None`.
pub fn load_classifier(path: &Path) -> Option<Arc<dyn Classifier>> {
    if !path.exists() {
        error!(
            "Model file not found! Ensure '{}' is in the correct path.",
            path.display()
        );
        return None;
    }

    match LinearTextClassifier::from_path(path) {
        Ok(model) => {
            info!(
                "Model loaded successfully from {} ({} features)",
                path.display(),
                model.n_features()
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            error!("Error loading model: {}", e);
            None
        }
    }
}
