use actix_web::http::header;
use actix_web::{web, HttpResponse, Result};
use futures_util::StreamExt;
use log::{error, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{AppState, MessageResponse, PredictionResponse};

/// Origin that manual preflight responses are pinned to.
#[derive(Debug, Clone)]
pub struct PreflightOrigin(pub String);

pub async fn predict(
    state: web::Data<AppState>,
    mut payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let classifier = match &state.classifier {
        Some(classifier) => classifier.clone(),
        None => {
            error!("Prediction requested but no model is loaded");
            return Err(ApiError::ModelNotLoaded);
        }
    };

    let request_id = Uuid::new_v4();

    let text = async {
        let body = read_body(&mut payload, state.payload_limit).await?;
        info!("[{}] Received data: {}", request_id, String::from_utf8_lossy(&body));
        extract_text(&body)
    }
    .await
    .map_err(|e| {
        warn!("[{}] Rejected request: {}", request_id, e);
        e
    })?;

    let label = web::block(move || classifier.classify(&text))
        .await
        .map_err(|e| e.to_string())
        .and_then(|res| res.map_err(|e| e.to_string()))
        .map_err(|msg| {
            error!("[{}] Error during prediction: {}", request_id, msg);
            ApiError::Prediction(msg)
        })?;

    info!("[{}] Prediction: {:?}", request_id, label);
    Ok(HttpResponse::Ok().json(PredictionResponse { prediction: label }))
}

/// Collects the request body, refusing anything over `limit` bytes.
async fn read_body(payload: &mut web::Payload, limit: usize) -> Result<web::BytesMut, ApiError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadPayload(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Pulls the trimmed `text` field out of a raw JSON body.
fn extract_text(body: &[u8]) -> Result<String, ApiError> {
    let data: Value = serde_json::from_slice(body).map_err(|_| ApiError::MissingText)?;

    match data.get("text") {
        None => Err(ApiError::MissingText),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Err(ApiError::EmptyText)
            } else {
                Ok(text.to_string())
            }
        }
        Some(_) => Err(ApiError::Prediction("'text' field must be a string".to_string())),
    }
}

pub async fn preflight(origin: web::Data<PreflightOrigin>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.0.as_str()))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
        .json(MessageResponse {
            message: "CORS preflight response OK",
        })
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: "Fake News Detection API is running!",
    })
}
