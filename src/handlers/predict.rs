use serde_json::Value;

use crate::models::{InferenceErrorBody, PredictResponse, UserInput};
use crate::services::{InferenceError, InferenceService, ModelInfo};
use crate::validation::ValidationErrors;

/// Why a prediction request failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 422,
            ApiError::Inference(_) => 500,
        }
    }

    /// JSON body sent back to the caller.
    pub fn body(&self) -> Value {
        let body = match self {
            ApiError::Validation(errors) => serde_json::to_value(errors),
            ApiError::Inference(e) => serde_json::to_value(InferenceErrorBody {
                error: e.to_string(),
            }),
        };
        body.unwrap_or(Value::Null)
    }
}

/// Request pipeline for `/predict`: validate, infer, build the response.
pub struct PredictHandler {
    inference: InferenceService,
}

impl PredictHandler {
    pub fn new(inference: InferenceService) -> Self {
        Self { inference }
    }

    pub fn handle(&self, body: &Value) -> Result<PredictResponse, ApiError> {
        let input = UserInput::from_json(body).map_err(|errors| {
            log::info!("🚫 Rejected prediction request: {}", errors);
            errors
        })?;

        let verdict = self.inference.predict(&input).map_err(|e| {
            log::error!("❌ Inference failed: {}", e);
            e
        })?;

        log::info!("✅ Prediction served: {}", verdict);
        Ok(PredictResponse::from(verdict))
    }

    pub fn model_info(&self) -> ModelInfo {
        self.inference.model_info()
    }
}
