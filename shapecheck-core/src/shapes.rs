//! Domain shapes: User and Order, as declarative shapes and as typed records.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::{FieldType, Shape, ValidationResult};

pub const USER: Shape = Shape::new(
    "User",
    &[
        ("id", FieldType::Number),
        ("name", FieldType::String),
        ("email", FieldType::String),
    ],
);

pub const ORDER: Shape = Shape::new(
    "Order",
    &[
        ("orderId", FieldType::Number),
        ("userId", FieldType::Number),
        ("amount", FieldType::Number),
    ],
);

/// User record as served by the user service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Order record as served by the order service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: f64,
}

/// Typed record with a declared shape.
pub trait Shaped: DeserializeOwned {
    const SHAPE: Shape;
}

impl Shaped for User {
    const SHAPE: Shape = USER;
}

impl Shaped for Order {
    const SHAPE: Shape = ORDER;
}

#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("{shape} {result}")]
    Invalid {
        shape: &'static str,
        result: ValidationResult,
    },
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ShapeError {
    /// Diagnostics of a failed validation; empty for decode failures.
    pub fn errors(&self) -> &[String] {
        match self {
            ShapeError::Invalid { result, .. } => &result.errors,
            ShapeError::Decode(_) => &[],
        }
    }
}

/// Validate `value` against `T::SHAPE`, then deserialize it.
pub fn decode<T: Shaped>(value: &Value) -> Result<T, ShapeError> {
    let result = T::SHAPE.validate(value);
    if !result.is_valid {
        return Err(ShapeError::Invalid {
            shape: T::SHAPE.name,
            result,
        });
    }
    Ok(T::deserialize(value)?)
}

/// Validate an array of `T::SHAPE` records, then deserialize it.
pub fn decode_vec<T: Shaped>(value: &Value) -> Result<Vec<T>, ShapeError> {
    let result = T::SHAPE.validate_array(value);
    if !result.is_valid {
        return Err(ShapeError::Invalid {
            shape: T::SHAPE.name,
            result,
        });
    }
    Ok(Vec::<T>::deserialize(value)?)
}

pub fn validate_user(data: &Value) -> ValidationResult {
    USER.validate(data)
}

pub fn validate_order(data: &Value) -> ValidationResult {
    ORDER.validate(data)
}

pub fn validate_order_array(data: &Value) -> ValidationResult {
    ORDER.validate_array(data)
}

pub fn is_user(data: &Value) -> bool {
    validate_user(data).is_valid
}

pub fn is_order(data: &Value) -> bool {
    validate_order(data).is_valid
}

pub fn is_order_array(data: &Value) -> bool {
    validate_order_array(data).is_valid
}
