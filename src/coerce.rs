//! Raw text to typed value conversion for path, query and header parameters.

use crate::spec::ParameterType;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A bound, typed parameter value.
///
/// Scalar variants come from [`coerce`]; [`ParamValue::Json`] holds a decoded body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Json(Value),
}

impl ParamValue {
    /// Short name of the variant, as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Str(_) => "string",
            ParamValue::I32(_) => "int32",
            ParamValue::I64(_) => "int64",
            ParamValue::F32(_) => "float32",
            ParamValue::F64(_) => "float64",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Json(_) => "json",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ParamValue::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Either integer width, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::I32(v) => Some(i64::from(*v)),
            ParamValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// Either float width, widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::F32(v) => Some(f64::from(*v)),
            ParamValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ParamValue::Json(v) => Some(v),
            _ => None,
        }
    }

    /// JSON rendering of the value, used when arguments are printed or forwarded.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::I32(v) => Value::from(*v),
            ParamValue::I64(v) => Value::from(*v),
            ParamValue::F32(v) => Value::from(f64::from(*v)),
            ParamValue::F64(v) => Value::from(*v),
            ParamValue::Bool(v) => Value::Bool(*v),
            ParamValue::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::I32(v) => write!(f, "{v}"),
            ParamValue::I64(v) => write!(f, "{v}"),
            ParamValue::F32(v) => write!(f, "{v}"),
            ParamValue::F64(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Why a raw value could not be coerced. Rendered as `parsing "<raw>": <reason>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoerceError {
    raw: String,
    reason: String,
}

impl CoerceError {
    fn new(raw: &str, reason: impl fmt::Display) -> Self {
        Self {
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parsing {:?}: {}", self.raw, self.reason)
    }
}

impl std::error::Error for CoerceError {}

/// Tokens accepted for booleans; anything else is malformed.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Convert `raw` to the declared scalar type.
///
/// Integers are base 10 and must fit the declared width. A float literal that is
/// finite as text but does not fit an `f32` is rejected for `Float32`.
///
/// # Errors
///
/// [`CoerceError`] naming the raw input. Structured types are never coerced from
/// text and always fail.
pub fn coerce(raw: &str, ty: ParameterType) -> Result<ParamValue, CoerceError> {
    match ty {
        ParameterType::String => Ok(ParamValue::Str(raw.to_string())),
        ParameterType::Int32 => raw
            .parse::<i32>()
            .map(ParamValue::I32)
            .map_err(|e| CoerceError::new(raw, e)),
        ParameterType::Int64 => raw
            .parse::<i64>()
            .map(ParamValue::I64)
            .map_err(|e| CoerceError::new(raw, e)),
        ParameterType::Float32 => {
            let parsed = raw.parse::<f32>().map_err(|e| CoerceError::new(raw, e))?;
            if parsed.is_infinite() && raw.parse::<f64>().is_ok_and(f64::is_finite) {
                return Err(CoerceError::new(raw, "value out of range for float32"));
            }
            Ok(ParamValue::F32(parsed))
        }
        ParameterType::Float64 => raw
            .parse::<f64>()
            .map(ParamValue::F64)
            .map_err(|e| CoerceError::new(raw, e)),
        ParameterType::Boolean => parse_bool(raw)
            .map(ParamValue::Bool)
            .ok_or_else(|| CoerceError::new(raw, "invalid boolean literal")),
        ParameterType::Object | ParameterType::Array | ParameterType::Map => Err(
            CoerceError::new(raw, format!("{ty} values are only accepted in the body")),
        ),
    }
}
