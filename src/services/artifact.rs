//! Serialized model artifact: a preprocessing stage (standardized numeric
//! columns, one-hot categorical columns) followed by a binary estimator.
//!
//! Artifacts are JSON documents produced by the offline training pipeline:
//!
//! ```json
//! {
//!   "name": "acne-risk-classifier",
//!   "version": "1.0.0",
//!   "columns": [
//!     { "kind": "numeric", "name": "age", "mean": 30.0, "scale": 12.0 },
//!     { "kind": "categorical", "name": "gender", "categories": ["female", "male"] }
//!   ],
//!   "estimator": { "type": "logistic_regression", "coefficients": [..], "intercept": 0.0 }
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::features::{FeatureRow, FeatureValue, FEATURE_COLUMNS};
use super::predictor::{InferenceError, ModelInfo, Predictor};
use crate::models::RiskLabel;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Model artifact checksum mismatch: expected {expected}, found {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoder {
    /// Standardized as `(x - mean) / scale`.
    Numeric {
        name: String,
        #[serde(default)]
        mean: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    /// One-hot encoded in category order.
    Categorical {
        name: String,
        categories: Vec<String>,
    },
}

fn unit_scale() -> f64 {
    1.0
}

impl ColumnEncoder {
    pub fn name(&self) -> &str {
        match self {
            ColumnEncoder::Numeric { name, .. } | ColumnEncoder::Categorical { name, .. } => name,
        }
    }

    /// Number of estimator inputs this column expands to.
    pub fn width(&self) -> usize {
        match self {
            ColumnEncoder::Numeric { .. } => 1,
            ColumnEncoder::Categorical { categories, .. } => categories.len(),
        }
    }

    fn encode(&self, value: FeatureValue, out: &mut Vec<f64>) -> Result<(), InferenceError> {
        match (self, value) {
            (ColumnEncoder::Numeric { mean, scale, .. }, FeatureValue::Number(x)) => {
                out.push((x - mean) / scale);
                Ok(())
            }
            (ColumnEncoder::Categorical { name, categories }, FeatureValue::Category(c)) => {
                let hot = categories.iter().position(|known| known == c).ok_or_else(|| {
                    InferenceError::UnknownCategory {
                        column: name.clone(),
                        value: c.to_string(),
                    }
                })?;
                out.extend((0..categories.len()).map(|i| if i == hot { 1.0 } else { 0.0 }));
                Ok(())
            }
            (ColumnEncoder::Numeric { name, .. }, other) => Err(InferenceError::UnexpectedValue {
                column: name.clone(),
                expected: "numeric",
                value: other.to_string(),
            }),
            (ColumnEncoder::Categorical { name, .. }, other) => {
                Err(InferenceError::UnexpectedValue {
                    column: name.clone(),
                    expected: "categorical",
                    value: other.to_string(),
                })
            }
        }
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ColumnEncoder::Numeric { name, mean, scale } => {
                if !mean.is_finite() || !scale.is_finite() || *scale == 0.0 {
                    return Err(ArtifactError::Invalid(format!(
                        "column '{}' needs a finite mean and a finite non-zero scale",
                        name
                    )));
                }
            }
            ColumnEncoder::Categorical { name, categories } => {
                if categories.is_empty() {
                    return Err(ArtifactError::Invalid(format!(
                        "column '{}' has no categories",
                        name
                    )));
                }
                for (i, category) in categories.iter().enumerate() {
                    if categories[..i].contains(category) {
                        return Err(ArtifactError::Invalid(format!(
                            "column '{}' lists category '{}' twice",
                            name, category
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Goes to `left` when `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        label: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression {
        coefficients: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    DecisionTree {
        nodes: Vec<TreeNode>,
    },
}

fn default_threshold() -> f64 {
    0.5
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::LogisticRegression { .. } => "logistic_regression",
            Estimator::DecisionTree { .. } => "decision_tree",
        }
    }

    fn predict(&self, x: &[f64]) -> Result<i64, InferenceError> {
        match self {
            Estimator::LogisticRegression {
                coefficients,
                intercept,
                threshold,
            } => {
                if coefficients.len() != x.len() {
                    return Err(InferenceError::Model(format!(
                        "X has {} features, but the estimator is expecting {} features as input",
                        x.len(),
                        coefficients.len()
                    )));
                }
                let z: f64 = coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + intercept;
                // Saturates to 0 or 1 at infinity; only opposing infinities are undefined.
                if z.is_nan() {
                    return Err(InferenceError::Model("decision function is NaN".to_string()));
                }
                let probability = 1.0 / (1.0 + (-z).exp());
                Ok(if probability > *threshold { 1 } else { 0 })
            }
            Estimator::DecisionTree { nodes } => {
                let mut index = 0;
                // A well-formed tree reaches a leaf in fewer steps than it has nodes.
                for _ in 0..nodes.len() {
                    let node = nodes.get(index).ok_or_else(|| {
                        InferenceError::Model(format!("decision tree has no node {}", index))
                    })?;
                    match node {
                        TreeNode::Leaf { label } => return Ok(*label),
                        TreeNode::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            let value = x.get(*feature).ok_or_else(|| {
                                InferenceError::Model(format!(
                                    "decision tree split on feature {} of {}",
                                    feature,
                                    x.len()
                                ))
                            })?;
                            index = if value <= threshold { *left } else { *right };
                        }
                    }
                }
                Err(InferenceError::Model(
                    "decision tree traversal did not reach a leaf".to_string(),
                ))
            }
        }
    }

    fn validate(&self, width: usize) -> Result<(), ArtifactError> {
        match self {
            Estimator::LogisticRegression {
                coefficients,
                intercept,
                threshold,
            } => {
                if coefficients.len() != width {
                    return Err(ArtifactError::Invalid(format!(
                        "logistic regression has {} coefficients but the encoded width is {}",
                        coefficients.len(),
                        width
                    )));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ArtifactError::Invalid(
                        "logistic regression weights must be finite".to_string(),
                    ));
                }
                if !(*threshold > 0.0 && *threshold < 1.0) {
                    return Err(ArtifactError::Invalid(format!(
                        "threshold {} is outside (0, 1)",
                        threshold
                    )));
                }
            }
            Estimator::DecisionTree { nodes } => {
                if nodes.is_empty() {
                    return Err(ArtifactError::Invalid("decision tree has no nodes".to_string()));
                }
                for (i, node) in nodes.iter().enumerate() {
                    if let TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } = node
                    {
                        if *feature >= width {
                            return Err(ArtifactError::Invalid(format!(
                                "node {} splits on feature {} but the encoded width is {}",
                                i, feature, width
                            )));
                        }
                        if *left >= nodes.len() || *right >= nodes.len() {
                            return Err(ArtifactError::Invalid(format!(
                                "node {} points outside the tree",
                                i
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub columns: Vec<ColumnEncoder>,
    pub estimator: Estimator,
}

fn default_version() -> String {
    "0".to_string()
}

impl ModelArtifact {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        let names: Vec<&str> = self.columns.iter().map(ColumnEncoder::name).collect();
        if names != FEATURE_COLUMNS {
            return Err(ArtifactError::Invalid(format!(
                "columns {:?} do not match the feature layout {:?}",
                names, FEATURE_COLUMNS
            )));
        }
        for column in &self.columns {
            column.validate()?;
        }
        self.estimator.validate(self.encoded_width())
    }

    pub fn encoded_width(&self) -> usize {
        self.columns.iter().map(ColumnEncoder::width).sum()
    }

    /// Expand a feature row into the estimator's numeric input.
    pub fn encode(&self, row: &FeatureRow) -> Result<Vec<f64>, InferenceError> {
        let mut x = Vec::with_capacity(self.encoded_width());
        for column in &self.columns {
            let value = row
                .get(column.name())
                .ok_or_else(|| InferenceError::MissingColumn(column.name().to_string()))?;
            column.encode(value, &mut x)?;
        }
        Ok(x)
    }

    pub fn predict(&self, row: &FeatureRow) -> Result<RiskLabel, InferenceError> {
        let x = self.encode(row)?;
        let label = self.estimator.predict(&x)?;
        RiskLabel::try_from(label).map_err(InferenceError::InvalidLabel)
    }
}

/// An artifact loaded at startup, together with its fingerprint.
pub struct LoadedModel {
    artifact: ModelArtifact,
    sha256: Option<String>,
    loaded_at: DateTime<Utc>,
}

impl LoadedModel {
    /// Read, fingerprint and validate the artifact at `path`. When
    /// `expected_sha256` is given the file digest must match it.
    pub fn load(path: impl AsRef<Path>, expected_sha256: Option<&str>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let actual = hex::encode(Sha256::digest(&bytes));
        if let Some(expected) = expected_sha256 {
            let expected = expected.trim().to_lowercase();
            if expected != actual {
                return Err(ArtifactError::ChecksumMismatch { expected, actual });
            }
            log::debug!("Model artifact checksum verified");
        }

        let artifact = ModelArtifact::from_slice(&bytes)?;
        log::info!(
            "📦 Loaded model '{}' v{} ({}, {} encoded inputs) from {} sha256={}",
            artifact.name,
            artifact.version,
            artifact.estimator.kind(),
            artifact.encoded_width(),
            path.display(),
            actual
        );

        Ok(Self {
            artifact,
            sha256: Some(actual),
            loaded_at: Utc::now(),
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        Ok(Self {
            artifact,
            sha256: None,
            loaded_at: Utc::now(),
        })
    }
}

impl Predictor for LoadedModel {
    fn predict(&self, row: &FeatureRow) -> Result<RiskLabel, InferenceError> {
        self.artifact.predict(row)
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            name: self.artifact.name.clone(),
            version: self.artifact.version.clone(),
            estimator: self.artifact.estimator.kind().to_string(),
            features: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            sha256: self.sha256.clone(),
            loaded_at: self.loaded_at,
        }
    }
}
