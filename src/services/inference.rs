use std::sync::Arc;

use super::features::FeatureRow;
use super::predictor::{InferenceError, ModelInfo, Predictor};
use crate::models::{UserInput, Verdict};

/// Turns a validated request into a verdict using the injected predictor.
#[derive(Clone)]
pub struct InferenceService {
    predictor: Arc<dyn Predictor>,
}

impl InferenceService {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self { predictor }
    }

    pub fn predict(&self, input: &UserInput) -> Result<Verdict, InferenceError> {
        let row = FeatureRow::from_input(input);
        log::debug!("🧮 Feature row: {:?}", row.values());

        let label = self.predictor.predict(&row)?;
        let verdict = Verdict::from(label);
        log::debug!("✅ Model label {:?} -> {}", label, verdict);

        Ok(verdict)
    }

    pub fn model_info(&self) -> ModelInfo {
        self.predictor.describe()
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockPredictor;
    use super::*;
    use crate::models::{Diet, Gender, RiskLabel, SmokingOrVaping};
    use crate::services::artifact::{LoadedModel, ModelArtifact};

    fn sample_input() -> UserInput {
        UserInput::new(
            22,
            Gender::Male,
            55.0,
            Diet::Unhealthy,
            2.0,
            0.1,
            SmokingOrVaping::Yes,
        )
        .unwrap()
    }

    #[test]
    fn test_maps_labels_to_verdicts() {
        let risk = InferenceService::new(Arc::new(MockPredictor::returning(RiskLabel::Risk)));
        let no_risk = InferenceService::new(Arc::new(MockPredictor::returning(RiskLabel::NoRisk)));

        assert_eq!(risk.predict(&sample_input()).unwrap(), Verdict::AcneRisk);
        assert_eq!(no_risk.predict(&sample_input()).unwrap(), Verdict::NoAcneRisk);
    }

    #[test]
    fn test_propagates_inference_errors() {
        let predictor = Arc::new(MockPredictor::failing(InferenceError::Model(
            "model exploded".to_string(),
        )));
        let service = InferenceService::new(predictor.clone());

        let err = service.predict(&sample_input()).unwrap_err();
        assert_eq!(err.to_string(), "model exploded");
        assert_eq!(predictor.calls(), 1);
    }

    #[test]
    fn test_repeated_calls_are_idempotent() {
        let artifact =
            ModelArtifact::from_slice(include_bytes!("../../models/acne_model.json")).unwrap();
        let service = InferenceService::new(Arc::new(LoadedModel::from_artifact(artifact).unwrap()));

        let first = service.predict(&sample_input()).unwrap();
        for _ in 0..10 {
            assert_eq!(service.predict(&sample_input()).unwrap(), first);
        }
    }
}
