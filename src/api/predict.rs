use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::ml::inferencer::{Predictor, DECISION_THRESHOLD};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub content: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub probability: f32,
    pub is_member: bool,
}

/// The predictor is loaded once by the caller and never replaced.
pub fn router(predictor: Arc<Predictor>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(super::health))
        .with_state(predictor)
}

async fn predict(
    State(predictor): State<Arc<Predictor>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, (StatusCode, String)> {
    if request.content.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "content must not be empty".to_string()));
    }

    let probability = predictor.predict(&request.content).map_err(|e| {
        tracing::error!("Prediction failed: {:#}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "prediction failed".to_string())
    })?;

    Ok(Json(PredictResponse {
        probability,
        is_member: probability >= DECISION_THRESHOLD,
    }))
}
