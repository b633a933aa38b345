use serde::{Deserialize, Serialize};

use crate::validation::{FieldError, UncheckedInput, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    Healthy,
    Unhealthy,
}

impl Diet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Diet::Healthy => "healthy",
            Diet::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingOrVaping {
    Yes,
    No,
}

impl SmokingOrVaping {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmokingOrVaping::Yes => "yes",
            SmokingOrVaping::No => "no",
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }
        )*
    };
}

impl_display_as_str!(Gender, Diet, SmokingOrVaping);

/// One prediction request. Only constructible through validation, so holding
/// a `UserInput` means every field is present and in range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInput {
    age: i64,
    gender: Gender,
    weight_kg: f64,
    diet: Diet,
    sleep_hours: f64,
    water_intake_liters: f64,
    smoking_or_vaping: SmokingOrVaping,
}

impl UserInput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        age: i64,
        gender: Gender,
        weight_kg: f64,
        diet: Diet,
        sleep_hours: f64,
        water_intake_liters: f64,
        smoking_or_vaping: SmokingOrVaping,
    ) -> Result<Self, ValidationErrors> {
        let unchecked = UncheckedInput {
            age: Some(age),
            gender: Some(gender),
            weight_kg: Some(weight_kg),
            diet: Some(diet),
            sleep_hours: Some(sleep_hours),
            water_intake_liters: Some(water_intake_liters),
            smoking_or_vaping: Some(smoking_or_vaping),
        };
        Self::from_unchecked(unchecked, Vec::new())
    }

    /// Finish validation: `errors` holds coercion failures already found.
    pub(crate) fn from_unchecked(
        unchecked: UncheckedInput,
        mut errors: Vec<FieldError>,
    ) -> Result<Self, ValidationErrors> {
        errors.extend(unchecked.bound_errors());
        if !errors.is_empty() {
            return Err(ValidationErrors::in_field_order(errors));
        }

        match unchecked {
            UncheckedInput {
                age: Some(age),
                gender: Some(gender),
                weight_kg: Some(weight_kg),
                diet: Some(diet),
                sleep_hours: Some(sleep_hours),
                water_intake_liters: Some(water_intake_liters),
                smoking_or_vaping: Some(smoking_or_vaping),
            } => Ok(Self {
                age,
                gender,
                weight_kg,
                diet,
                sleep_hours,
                water_intake_liters,
                smoking_or_vaping,
            }),
            unchecked => {
                let missing = serde_json::to_value(&unchecked)
                    .ok()
                    .and_then(|v| v.as_object().cloned())
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|(_, value)| value.is_null())
                    .map(|(field, _)| FieldError::missing(&field))
                    .collect();
                Err(ValidationErrors::in_field_order(missing))
            }
        }
    }

    /// Validate an untyped JSON request body, collecting every field error.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, ValidationErrors> {
        crate::validation::validate_user_input(body)
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn diet(&self) -> Diet {
        self.diet
    }

    pub fn sleep_hours(&self) -> f64 {
        self.sleep_hours
    }

    pub fn water_intake_liters(&self) -> f64 {
        self.water_intake_liters
    }

    pub fn smoking_or_vaping(&self) -> SmokingOrVaping {
        self.smoking_or_vaping
    }
}

/// Binary model output: 0 = no risk, 1 = risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLabel {
    NoRisk,
    Risk,
}

impl TryFrom<i64> for RiskLabel {
    type Error = i64;

    fn try_from(label: i64) -> Result<Self, Self::Error> {
        match label {
            0 => Ok(RiskLabel::NoRisk),
            1 => Ok(RiskLabel::Risk),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    AcneRisk,
    NoAcneRisk,
}

impl From<RiskLabel> for Verdict {
    fn from(label: RiskLabel) -> Self {
        match label {
            RiskLabel::Risk => Verdict::AcneRisk,
            RiskLabel::NoRisk => Verdict::NoAcneRisk,
        }
    }
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::AcneRisk => "acne risk",
            Verdict::NoAcneRisk => "no acne risk",
        }
    }

    pub fn message(&self) -> String {
        format!("You have {}.", self.as_str())
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub message: String,
}

impl From<Verdict> for PredictResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            message: verdict.message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceErrorBody {
    #[serde(rename = "Error")]
    pub error: String,
}
