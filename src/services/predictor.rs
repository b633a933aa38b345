use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::features::FeatureRow;
use crate::models::RiskLabel;

/// Failures raised while encoding features or evaluating the model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("Found unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Column '{0}' is missing from the feature row")]
    MissingColumn(String),

    #[error("Column '{column}' expected a {expected} value but got '{value}'")]
    UnexpectedValue {
        column: String,
        expected: &'static str,
        value: String,
    },

    #[error("Model produced label {0}, expected 0 or 1")]
    InvalidLabel(i64),

    #[error("{0}")]
    Model(String),
}

/// Metadata describing the loaded predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub estimator: String,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// A pre-trained binary classifier. Implementations are shared read-only
/// across concurrent requests.
pub trait Predictor: Send + Sync {
    fn predict(&self, row: &FeatureRow) -> Result<RiskLabel, InferenceError>;

    fn describe(&self) -> ModelInfo;
}
