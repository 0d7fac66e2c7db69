//! Parsed WaveDrom diagram descriptions.
//!
//! WaveDrom sources are usually written as JavaScript object literals
//! (unquoted keys, single quotes, trailing commas) rather than strict JSON.
//! Strict JSON is tried first and JSON5 second, which covers both forms.

use serde_json::Value;

/// Error returned when a block payload is not a usable diagram description.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    /// The payload is neither JSON nor JSON5.
    #[error("invalid diagram description: {0}")]
    Syntax(String),
    /// The payload parsed but is not an object.
    #[error("diagram description must be an object, found {0}")]
    NotAnObject(&'static str),
}

/// A structured WaveDrom description (always a JSON object).
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramDescription {
    value: Value,
}

impl DiagramDescription {
    /// Parse a block payload.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptionError`] if the payload is not structured data or
    /// its top level is not an object.
    pub fn parse(payload: &str) -> Result<Self, DescriptionError> {
        let value = match serde_json::from_str::<Value>(payload) {
            Ok(value) => value,
            Err(_) => json5::from_str::<Value>(payload)
                .map_err(|e| DescriptionError::Syntax(e.to_string()))?,
        };

        if !value.is_object() {
            return Err(DescriptionError::NotAnObject(kind_name(&value)));
        }

        Ok(Self { value })
    }

    /// Normalized strict-JSON form, pretty printed.
    #[must_use]
    pub fn to_json(&self) -> String {
        format!("{:#}", self.value)
    }

    /// Number of entries in the top-level `signal` array (0 if absent).
    #[must_use]
    pub fn signal_count(&self) -> usize {
        self.value
            .get("signal")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Underlying JSON value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.value
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
