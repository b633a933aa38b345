//! Structural validation of prediction requests.
//!
//! Every field is checked independently and all failures are reported at
//! once, each located at `["body", <field>]`, so a caller can fix a whole
//! form in one round trip. Fields are first coerced through serde (numbers
//! may also arrive as numeric strings), then the coerced values are checked
//! against their bounds with `validator`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::Validate;

use crate::models::{Diet, Gender, SmokingOrVaping, UserInput};
use crate::services::FEATURE_COLUMNS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
}

impl FieldError {
    fn at(field: &str, kind: &'static str, msg: impl Into<String>, input: Option<Value>) -> Self {
        Self {
            kind,
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
            input,
            ctx: None,
        }
    }

    fn with_ctx(mut self, ctx: Value) -> Self {
        self.ctx = Some(ctx);
        self
    }

    pub fn missing(field: &str) -> Self {
        Self::at(field, "missing", "Field required", None)
    }

    pub fn greater_than(field: &str, limit: Value, input: Value) -> Self {
        Self::at(
            field,
            "greater_than",
            format!("Input should be greater than {}", limit),
            Some(input),
        )
        .with_ctx(json!({ "gt": limit }))
    }

    pub fn less_than(field: &str, limit: Value, input: Value) -> Self {
        Self::at(
            field,
            "less_than",
            format!("Input should be less than {}", limit),
            Some(input),
        )
        .with_ctx(json!({ "lt": limit }))
    }

    /// Maps a `validator` range failure onto the bound it broke.
    pub fn out_of_range(field: &str, error: &validator::ValidationError, input: Value) -> Self {
        let value = input.as_f64();
        let broken = |bound: &str, breaks: fn(f64, f64) -> bool| {
            let limit = error.params.get(bound)?;
            let l = limit.as_f64()?;
            if !breaks(value?, l) {
                return None;
            }
            // Integer fields report integer bounds.
            if input.is_i64() && l.fract() == 0.0 {
                Some(json!(l as i64))
            } else {
                Some(limit.clone())
            }
        };

        if let Some(limit) = broken("exclusive_min", |v, l| v <= l) {
            Self::greater_than(field, limit, input)
        } else if let Some(limit) = broken("exclusive_max", |v, l| v >= l) {
            Self::less_than(field, limit, input)
        } else {
            Self::at(field, "value_error", format!("Value error, {}", error), Some(input))
        }
    }

    pub fn int_type(field: &str, input: &Value) -> Self {
        Self::at(field, "int_type", "Input should be a valid integer", Some(input.clone()))
    }

    pub fn int_parsing(field: &str, input: &Value) -> Self {
        Self::at(
            field,
            "int_parsing",
            "Input should be a valid integer, unable to parse string as an integer",
            Some(input.clone()),
        )
    }

    pub fn int_from_float(field: &str, input: &Value) -> Self {
        Self::at(
            field,
            "int_from_float",
            "Input should be a valid integer, got a number with a fractional part",
            Some(input.clone()),
        )
    }

    pub fn float_type(field: &str, input: &Value) -> Self {
        Self::at(field, "float_type", "Input should be a valid number", Some(input.clone()))
    }

    pub fn float_parsing(field: &str, input: &Value) -> Self {
        Self::at(
            field,
            "float_parsing",
            "Input should be a valid number, unable to parse string as a number",
            Some(input.clone()),
        )
    }

    pub fn finite_number(field: &str, input: Value) -> Self {
        Self::at(field, "finite_number", "Input should be a finite number", Some(input))
    }

    pub fn string_type(field: &str, input: &Value) -> Self {
        Self::at(field, "string_type", "Input should be a valid string", Some(input.clone()))
    }

    /// `reason` is serde's description of the unknown variant.
    pub fn literal(field: &str, reason: impl std::fmt::Display, input: &Value) -> Self {
        Self::at(
            field,
            "literal_error",
            format!("Input should be a listed option: {}", reason),
            Some(input.clone()),
        )
    }

    pub fn not_an_object(input: &Value) -> Self {
        Self {
            kind: "model_attributes_type",
            loc: vec!["body".to_string()],
            msg: "Input should be a valid dictionary or object to extract fields from".to_string(),
            input: Some(input.clone()),
            ctx: None,
        }
    }

    pub fn json_invalid(detail: impl Into<String>) -> Self {
        Self {
            kind: "json_invalid",
            loc: vec!["body".to_string()],
            msg: "JSON decode error".to_string(),
            input: None,
            ctx: Some(json!({ "error": detail.into() })),
        }
    }

    /// Field name this error is located at, or `"body"` for body-level errors.
    pub fn field(&self) -> &str {
        self.loc.last().map(String::as_str).unwrap_or("body")
    }
}

/// All field errors for one rejected request, serialized as `{"detail": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    detail: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(detail: Vec<FieldError>) -> Self {
        Self { detail }
    }

    pub fn single(error: FieldError) -> Self {
        Self::new(vec![error])
    }

    /// Orders errors by the position of their field in the request form.
    pub(crate) fn in_field_order(mut detail: Vec<FieldError>) -> Self {
        detail.sort_by_key(|e| {
            FEATURE_COLUMNS
                .iter()
                .position(|column| *column == e.field())
                .unwrap_or(usize::MAX)
        });
        Self::new(detail)
    }

    pub fn detail(&self) -> &[FieldError] {
        &self.detail
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.detail.iter().map(FieldError::field)
    }

    pub fn len(&self) -> usize {
        self.detail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detail.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .detail
            .iter()
            .map(|e| format!("{}: {}", e.field(), e.msg))
            .collect();
        write!(f, "{} validation error(s): {}", self.detail.len(), parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Request fields after type coercion, before their bounds are checked.
/// A `None` field failed coercion and already has an error recorded.
#[derive(Debug, Default, Serialize, Validate)]
pub(crate) struct UncheckedInput {
    #[validate(range(exclusive_min = 0, exclusive_max = 130))]
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    #[validate(range(exclusive_min = 0.0))]
    pub weight_kg: Option<f64>,
    pub diet: Option<Diet>,
    #[validate(range(exclusive_min = 0.0))]
    pub sleep_hours: Option<f64>,
    pub water_intake_liters: Option<f64>,
    pub smoking_or_vaping: Option<SmokingOrVaping>,
}

impl UncheckedInput {
    /// Bound violations of the coerced fields. Non-finite reals are reported
    /// as such instead of as range failures.
    pub(crate) fn bound_errors(&self) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = [
            ("weight_kg", self.weight_kg),
            ("sleep_hours", self.sleep_hours),
            ("water_intake_liters", self.water_intake_liters),
        ]
        .into_iter()
        .filter_map(|(field, value)| match value {
            Some(v) if !v.is_finite() => Some(FieldError::finite_number(field, json!(v.to_string()))),
            _ => None,
        })
        .collect();

        if let Err(out_of_range) = self.validate() {
            let snapshot = serde_json::to_value(self).unwrap_or(Value::Null);
            for (field, field_errors) in out_of_range.field_errors() {
                let field: &str = field.as_ref();
                if errors.iter().any(|e| e.field() == field) {
                    continue;
                }
                let input = snapshot.get(field).cloned().unwrap_or(Value::Null);
                errors.extend(
                    field_errors
                        .iter()
                        .map(|e| FieldError::out_of_range(field, e, input.clone())),
                );
            }
        }

        errors
    }
}

/// A JSON number, or a string that may hold one.
#[derive(Deserialize)]
#[serde(untagged)]
enum LaxNumber {
    Number(serde_json::Number),
    Text(String),
}

/// Validate a JSON request body into a `UserInput`.
pub fn validate_user_input(body: &Value) -> Result<UserInput, ValidationErrors> {
    let Some(object) = body.as_object() else {
        return Err(ValidationErrors::single(FieldError::not_an_object(body)));
    };

    let mut errors = Vec::new();
    let unchecked = UncheckedInput {
        age: collect(&mut errors, require(object, "age").and_then(parse_age)),
        gender: collect(&mut errors, require(object, "gender").and_then(|v| parse_choice("gender", v))),
        weight_kg: collect(
            &mut errors,
            require(object, "weight_kg").and_then(|v| parse_number("weight_kg", v)),
        ),
        diet: collect(&mut errors, require(object, "diet").and_then(|v| parse_choice("diet", v))),
        sleep_hours: collect(
            &mut errors,
            require(object, "sleep_hours").and_then(|v| parse_number("sleep_hours", v)),
        ),
        water_intake_liters: collect(
            &mut errors,
            require(object, "water_intake_liters")
                .and_then(|v| parse_number("water_intake_liters", v)),
        ),
        smoking_or_vaping: collect(
            &mut errors,
            require(object, "smoking_or_vaping").and_then(|v| parse_choice("smoking_or_vaping", v)),
        ),
    };

    UserInput::from_unchecked(unchecked, errors)
}

fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn require<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value, FieldError> {
    object.get(field).ok_or_else(|| FieldError::missing(field))
}

fn parse_age(value: &Value) -> Result<i64, FieldError> {
    match serde_json::from_value::<LaxNumber>(value.clone()) {
        Ok(LaxNumber::Number(n)) => match n.as_i64() {
            Some(age) => Ok(age),
            None => {
                // Integral floats such as 22.0 are accepted; out-of-range
                // values are caught by the bounds check.
                let f = n.as_f64().ok_or_else(|| FieldError::int_type("age", value))?;
                if f.fract() != 0.0 {
                    return Err(FieldError::int_from_float("age", value));
                }
                Ok(f as i64)
            }
        },
        Ok(LaxNumber::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| FieldError::int_parsing("age", value)),
        Err(_) => Err(FieldError::int_type("age", value)),
    }
}

fn parse_number(field: &str, value: &Value) -> Result<f64, FieldError> {
    match serde_json::from_value::<LaxNumber>(value.clone()) {
        Ok(LaxNumber::Number(n)) => n.as_f64().ok_or_else(|| FieldError::float_type(field, value)),
        Ok(LaxNumber::Text(text)) => {
            let number = text
                .trim()
                .parse::<f64>()
                .map_err(|_| FieldError::float_parsing(field, value))?;
            if !number.is_finite() {
                return Err(FieldError::finite_number(field, value.clone()));
            }
            Ok(number)
        }
        Err(_) => Err(FieldError::float_type(field, value)),
    }
}

fn parse_choice<T: DeserializeOwned>(field: &str, value: &Value) -> Result<T, FieldError> {
    if !value.is_string() {
        return Err(FieldError::string_type(field, value));
    }
    serde_json::from_value(value.clone()).map_err(|e| FieldError::literal(field, e, value))
}
