use serde::Serialize;

use crate::models::UserInput;

/// Column names in the order the model was fit on.
pub const FEATURE_COLUMNS: [&str; 7] = [
    "age",
    "gender",
    "weight_kg",
    "diet",
    "sleep_hours",
    "water_intake_liters",
    "smoking_or_vaping",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(&'static str),
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Category(c) => write!(f, "{}", c),
        }
    }
}

/// A single-row feature table matching the model's input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: [FeatureValue; 7],
}

impl FeatureRow {
    pub fn from_input(input: &UserInput) -> Self {
        Self {
            values: [
                FeatureValue::Number(input.age() as f64),
                FeatureValue::Category(input.gender().as_str()),
                FeatureValue::Number(input.weight_kg()),
                FeatureValue::Category(input.diet().as_str()),
                FeatureValue::Number(input.sleep_hours()),
                FeatureValue::Number(input.water_intake_liters()),
                FeatureValue::Category(input.smoking_or_vaping().as_str()),
            ],
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<FeatureValue> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FeatureValue)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
