use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Every failure `/predict` can surface. Each renders as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Model not loaded. Check server logs.")]
    ModelNotLoaded,
    #[error("Missing 'text' field in request")]
    MissingText,
    #[error("Empty 'text' field in request")]
    EmptyText,
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Invalid request body: {0}")]
    BadPayload(String),
    #[error("Prediction error: {0}")]
    Prediction(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingText | ApiError::EmptyText | ApiError::BadPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ModelNotLoaded | ApiError::Prediction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

/// Failures while reading the classifier artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed model file: {0}")]
    Format(#[from] serde_json::Error),
    #[error("invalid model: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            ApiError::ModelNotLoaded.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::MissingText.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::PayloadTooLarge(16).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(ApiError::EmptyText.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Prediction("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn prediction_message_embeds_cause() {
        assert_eq!(
            ApiError::Prediction("boom".into()).to_string(),
            "Prediction error: boom"
        );
    }
}
