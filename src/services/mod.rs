pub mod artifact; // Serialized model artifact + evaluation
pub mod client; // HTTP client for the /predict API
pub mod features;
pub mod inference;
pub mod predictor;

pub use artifact::{ArtifactError, LoadedModel, ModelArtifact};
pub use client::{ClientOutcome, PredictClient};
pub use features::{FeatureRow, FeatureValue, FEATURE_COLUMNS};
pub use inference::InferenceService;
pub use predictor::{InferenceError, ModelInfo, Predictor};
