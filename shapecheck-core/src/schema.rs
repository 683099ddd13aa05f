//! Runtime shape validation for untyped JSON. A shape is an ordered list of required fields
//! with their primitive types; one routine checks any shape and reports every violation.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Primitive JSON type a field must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// Any JSON number, integral or not.
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::Number => value.is_number(),
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the runtime JSON type of `value`, as used in diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Named set of required fields, checked in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub name: &'static str,
    pub fields: &'static [(&'static str, FieldType)],
}

impl Shape {
    pub const fn new(name: &'static str, fields: &'static [(&'static str, FieldType)]) -> Self {
        Self { name, fields }
    }

    pub fn validate(&self, data: &Value) -> ValidationResult {
        validate(self, data)
    }

    pub fn validate_array(&self, data: &Value) -> ValidationResult {
        validate_array(self, data)
    }
}

/// Outcome of one structural check. Serialises as `{"isValid": .., "errors": [..]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    fn rejected(message: &str) -> Self {
        Self::from_errors(vec![message.to_owned()])
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid {
            f.write_str("valid")
        } else {
            write!(f, "invalid: {}", self.errors.join("; "))
        }
    }
}

/// Check `data` against `shape`. Never fails: every violation ends up in `errors`.
pub fn validate(shape: &Shape, data: &Value) -> ValidationResult {
    let Some(object) = data.as_object() else {
        return ValidationResult::rejected("Response is not an object");
    };

    let errors = shape
        .fields
        .iter()
        .filter_map(|&(field, expected)| match object.get(field) {
            None => Some(format!("Missing required field: '{}'", field)),
            Some(value) if !expected.matches(value) => Some(format!(
                "Field '{}' must be a {}, got {}",
                field,
                expected,
                json_type_name(value)
            )),
            Some(_) => None,
        })
        .collect();

    ValidationResult::from_errors(errors)
}

/// Check that `data` is an array whose every element conforms to `shape`.
/// Each failing element contributes one `"<Shape> at index <i>: ..."` entry.
pub fn validate_array(shape: &Shape, data: &Value) -> ValidationResult {
    let Some(items) = data.as_array() else {
        return ValidationResult::rejected("Response is not an array");
    };

    let errors = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let result = validate(shape, item);
            (!result.is_valid).then(|| {
                format!(
                    "{} at index {}: {}",
                    shape.name,
                    index,
                    result.errors.join(", ")
                )
            })
        })
        .collect();

    ValidationResult::from_errors(errors)
}
