//! Body pipeline: bounded read, schema validation, structural decode.
//!
//! Each step is a hard stop. The binder drives the steps in order so that every
//! transition is visible in its state machine; the stream is consumed by
//! [`read_bounded`] and dropped there on every exit path.

use crate::error::BindingError;
use crate::request::BodyStream;
use crate::spec::ParameterType;
use crate::validator::{CompiledSchema, SchemaValidator};
use serde_json::Value;
use std::io::{ErrorKind, Read};
use tracing::{debug, warn};

/// Read size per chunk; cancellation is checked before each chunk.
pub const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Read the whole body, refusing anything larger than `limit` bytes.
///
/// A declared `Content-Length` above the limit is refused without reading. Otherwise
/// at most `limit + 1` bytes are read, which is enough to tell "exactly at the limit"
/// from "over it".
///
/// # Errors
///
/// - [`BindingError::BodyTooLarge`] when the body exceeds `limit`
/// - [`BindingError::BodyUnreadable`] on I/O failure or cancellation
pub fn read_bounded(mut stream: BodyStream, limit: usize) -> Result<Vec<u8>, BindingError> {
    if let Some(declared) = stream.content_length() {
        if declared > limit as u64 {
            warn!(declared, limit, "Declared body length exceeds limit");
            return Err(BindingError::BodyTooLarge { limit });
        }
    }

    let initial = stream
        .content_length()
        .map(|len| len as usize)
        .unwrap_or(0)
        .min(limit);
    let mut body = Vec::with_capacity(initial);
    let mut chunk = [0u8; READ_CHUNK_BYTES];

    loop {
        let remaining = limit.saturating_add(1).saturating_sub(body.len());
        if remaining == 0 {
            break;
        }
        let want = remaining.min(READ_CHUNK_BYTES);
        match stream.read(&mut chunk[..want]) {
            Ok(0) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, bytes_read = body.len(), "Body read failed");
                return Err(BindingError::BodyUnreadable {
                    cause: e.to_string(),
                });
            }
        }
    }

    if body.len() > limit {
        warn!(limit, "Body exceeds limit");
        return Err(BindingError::BodyTooLarge { limit });
    }
    debug!(bytes = body.len(), limit, "Body read");
    Ok(body)
}

/// Validate the materialized body against its compiled schema.
///
/// # Errors
///
/// [`BindingError::SchemaValidationFailure`] carrying every violation in validator order.
pub fn validate_against_schema(
    validator: &dyn SchemaValidator,
    schema: &CompiledSchema,
    payload: &[u8],
) -> Result<(), BindingError> {
    validator.validate(schema, payload).map_err(|violations| {
        debug!(
            schema = schema.name(),
            violations = violations.len(),
            "Body failed schema validation"
        );
        BindingError::SchemaValidationFailure { violations }
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches_type(value: &Value, ty: ParameterType) -> bool {
    match ty {
        ParameterType::Object | ParameterType::Map => value.is_object(),
        ParameterType::Array => value.is_array(),
        ParameterType::String => value.is_string(),
        ParameterType::Int32 => value
            .as_i64()
            .is_some_and(|v| i32::try_from(v).is_ok()),
        ParameterType::Int64 => value.is_i64(),
        ParameterType::Float32 | ParameterType::Float64 => value.is_number(),
        ParameterType::Boolean => value.is_boolean(),
    }
}

/// Parse the body into a JSON value whose shape matches the declared type.
///
/// # Errors
///
/// [`BindingError::BodyDecodeFailure`] naming the body parameter.
pub fn decode_structured(
    name: &str,
    ty: ParameterType,
    payload: &[u8],
) -> Result<Value, BindingError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| BindingError::BodyDecodeFailure {
            name: name.to_string(),
            cause: e.to_string(),
        })?;
    if !matches_type(&value, ty) {
        return Err(BindingError::BodyDecodeFailure {
            name: name.to_string(),
            cause: format!("expected {}, found {}", ty, json_kind(&value)),
        });
    }
    Ok(value)
}
