use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::{AppError, ErrorResponse};
use std::time::Instant;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dtos::predict::{latency_ms, PredictRequest, PredictResponse, ResponseMeta};
use crate::services::backends::{BackendError, FirstPrediction, Instance};
use crate::services::metrics::{record_inference, InferenceOutcome};
use crate::startup::AppState;

pub const INTERNAL_MODEL_ERROR: &str = "Internal Model Error";

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Inference failed: {0}")]
    Backend(#[from] BackendError),
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        match self {
            PredictError::Validation(errs) => AppError::from(errs).into_response(),
            PredictError::InvalidBody(_) => {
                ErrorResponse::new(self.to_string()).with_status(StatusCode::BAD_REQUEST)
            }
            // Backend detail stays in the logs.
            PredictError::Backend(_) => ErrorResponse::new(INTERNAL_MODEL_ERROR)
                .with_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

/// Forward one prompt to the inference backend and relay its first prediction.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, PredictError> {
    let start = Instant::now();

    let prompt = PredictRequest::from_body(&body)?.into_prompt()?;

    let backend = state.backend.as_ref();
    let result = backend
        .predict(vec![Instance::new(prompt.as_str())])
        .await
        .and_then(|response| response.into_first());

    let elapsed = start.elapsed();

    match result {
        Ok(FirstPrediction {
            prediction,
            model_version_id,
            deployed_model_id,
        }) => {
            record_inference(backend.name(), InferenceOutcome::Success, elapsed);
            tracing::info!(
                event = "inference_success",
                latency_ms = latency_ms(elapsed),
                input_chars = prompt.chars().count(),
                model_version = %model_version_id,
                deployed_model_id = deployed_model_id.as_deref().unwrap_or("-"),
                "Inference succeeded"
            );

            Ok(Json(PredictResponse {
                prediction,
                meta: ResponseMeta::from_elapsed(elapsed),
            }))
        }
        Err(e) => {
            record_inference(backend.name(), InferenceOutcome::Failure, elapsed);
            tracing::error!(
                event = "inference_failure",
                backend = backend.name(),
                error = %e,
                "Inference failed: {}",
                e
            );

            Err(PredictError::Backend(e))
        }
    }
}
