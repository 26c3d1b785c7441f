//! Scalar cell values and the AGS field coercion rule.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::schema::ColumnKind;

/// Shared null used when a row is shorter than its header.
pub(crate) static NULL: Value = Value::Null;

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Coerce a raw field into the narrowest scalar it represents.
    ///
    /// `none`, `null` and the empty string become [`Value::Null`],
    /// `true`/`false` become booleans (case-insensitive), numbers become
    /// integers when they have no fractional part and floats otherwise.
    /// Everything else stays a string.
    pub fn coerce(raw: &str) -> Value {
        let lower = raw.to_ascii_lowercase();
        match lower.as_str() {
            "" | "none" | "null" => return Value::Null,
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }

        match raw.parse::<f64>() {
            Ok(number) => Value::from_f64(number),
            Err(_) => Value::String(raw.to_string()),
        }
    }

    /// Wrap a float, narrowing whole numbers to integers.
    pub fn from_f64(number: f64) -> Value {
        const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
        if number.is_finite() && number.fract() == 0.0 && number.abs() < I64_BOUND {
            Value::Int(number as i64)
        } else {
            Value::Float(number)
        }
    }

    /// Wrap an optional float, keeping it a float.
    pub fn float_or_null(number: Option<f64>) -> Value {
        number.map(Value::Float).unwrap_or(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, coercing numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Null | Value::Bool(_) => None,
        }
    }

    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text used when the value becomes part of a synthesized key.
    ///
    /// Unlike [`fmt::Display`], a null renders as `None` so that keys built
    /// from incomplete rows stay non-empty and distinguishable.
    pub fn key_fragment(&self) -> String {
        match self {
            Value::Null => "None".to_string(),
            other => other.to_string(),
        }
    }

    /// The column kind this value naturally belongs to.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Null => ColumnKind::Any,
            Value::Bool(_) => ColumnKind::Boolean,
            Value::Int(_) => ColumnKind::Integer,
            Value::Float(_) => ColumnKind::Float,
            Value::String(_) => ColumnKind::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
