use std::sync::Arc;

use serde::Serialize;

use crate::classifier::{Classifier, Label};
use crate::config::DEFAULT_PAYLOAD_LIMIT;

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Option<Arc<dyn Classifier>>,
    /// Largest accepted request body, in bytes.
    pub payload_limit: usize,
}

impl AppState {
    pub fn new(classifier: Option<Arc<dyn Classifier>>) -> Self {
        Self {
            classifier,
            payload_limit: DEFAULT_PAYLOAD_LIMIT,
        }
    }

    pub fn with_payload_limit(mut self, limit: usize) -> Self {
        self.payload_limit = limit;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: Label,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
