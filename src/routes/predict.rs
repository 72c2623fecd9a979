use crate::{
    error::ClassifyError, formatter::ClassificationResult, model_service::ModelService,
    server::SharedState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

const ROUTE: &str = "/predict";

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub frames: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl PredictError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            PredictError::InvalidBody(rejection) => (rejection.status(), rejection.body_text()),
            PredictError::Classify(ClassifyError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            PredictError::Classify(ClassifyError::Decode { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to decode frame".to_string(),
            ),
            PredictError::Classify(ClassifyError::Inference(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Inference failed".to_string(),
            ),
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[instrument(skip(state, payload))]
pub async fn predict<M: ModelService>(
    State(state): State<SharedState<M>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, PredictError> {
    state.metrics.record_request(ROUTE);

    let Json(request) = payload.inspect_err(|rejection| {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
    })?;

    tracing::debug!("Received {} frames", request.frames.len());
    let start = Instant::now();
    let outcome = state.classifier.classify_blocking(request.frames).await;
    state
        .metrics
        .record_prediction_duration(start.elapsed().as_millis() as u64, ROUTE);

    match outcome {
        Ok(result) => {
            state.metrics.record_predicted_level(result.level);
            Ok(Json(result))
        }
        Err(err) => {
            match &err {
                ClassifyError::Validation(e) => tracing::warn!("Invalid request: {}", e),
                other => tracing::error!("Prediction failed: {}", other),
            }
            state.metrics.record_prediction_error(err.kind());
            Err(err.into())
        }
    }
}
