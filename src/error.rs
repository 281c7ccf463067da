//! Error types for binding (per request) and startup (process-fatal).
//!
//! [`BindingError`] renders exactly the plain-text message the client receives
//! with its `400 Bad Request`; there is one message per failed request.
//! [`BindingError::Internal`] is the exception: the server's own manifest, schemas
//! or handlers disagree, and the request is answered with a `500`.

use crate::spec::ParameterLocation;
use crate::validator::{render_violations, ValidationIssue};
use std::fmt;

/// HTTP status used for every binding failure caused by the request.
pub const BINDING_ERROR_STATUS: u16 = 400;

/// HTTP status for [`BindingError::Internal`].
pub const INTERNAL_ERROR_STATUS: u16 = 500;

/// First failure encountered while binding a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A required parameter is absent from its location
    MissingRequiredParameter {
        name: String,
        location: ParameterLocation,
    },
    /// The raw value could not be coerced to the declared type
    MalformedParameterValue {
        name: String,
        location: ParameterLocation,
        cause: String,
    },
    /// The body exceeds the configured byte bound; nothing was parsed
    BodyTooLarge { limit: usize },
    /// Reading the body failed or the request was cancelled
    BodyUnreadable { cause: String },
    /// The body does not satisfy its schema
    SchemaValidationFailure { violations: Vec<String> },
    /// The schema-valid body could not be decoded into the declared type
    BodyDecodeFailure { name: String, cause: String },
    /// Server-side inconsistency, e.g. an uncompiled body schema or a handler
    /// reading a parameter as a kind the manifest does not declare
    Internal { cause: String },
}

impl BindingError {
    pub fn missing(name: &str, location: ParameterLocation) -> Self {
        BindingError::MissingRequiredParameter {
            name: name.to_string(),
            location,
        }
    }

    pub fn malformed(name: &str, location: ParameterLocation, cause: impl Into<String>) -> Self {
        BindingError::MalformedParameterValue {
            name: name.to_string(),
            location,
            cause: cause.into(),
        }
    }

    pub fn internal(cause: impl Into<String>) -> Self {
        BindingError::Internal {
            cause: cause.into(),
        }
    }

    /// `false` only for [`BindingError::Internal`].
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BindingError::Internal { .. })
    }

    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            BINDING_ERROR_STATUS
        } else {
            INTERNAL_ERROR_STATUS
        }
    }

    /// Stable identifier used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            BindingError::MissingRequiredParameter { .. } => "missing_required_parameter",
            BindingError::MalformedParameterValue { .. } => "malformed_parameter_value",
            BindingError::BodyTooLarge { .. } => "body_too_large",
            BindingError::BodyUnreadable { .. } => "body_unreadable",
            BindingError::SchemaValidationFailure { .. } => "schema_validation_failure",
            BindingError::BodyDecodeFailure { .. } => "body_decode_failure",
            BindingError::Internal { .. } => "internal",
        }
    }

    /// Name of the parameter the failure is attributed to, when there is one.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            BindingError::MissingRequiredParameter { name, .. }
            | BindingError::MalformedParameterValue { name, .. }
            | BindingError::BodyDecodeFailure { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingError::MissingRequiredParameter { name, location } => {
                write!(f, "Parameter '{}' expected in {}", name, location)
            }
            BindingError::MalformedParameterValue { name, cause, .. } => {
                write!(f, "Parameter '{}': {}", name, cause)
            }
            BindingError::BodyTooLarge { limit } => {
                write!(
                    f,
                    "Body unreadable: request body too large (limit {} bytes)",
                    limit
                )
            }
            BindingError::BodyUnreadable { cause } => write!(f, "Body unreadable: {}", cause),
            BindingError::SchemaValidationFailure { violations } => {
                write!(
                    f,
                    "Failed to validate against schema: {}",
                    render_violations(violations)
                )
            }
            BindingError::BodyDecodeFailure { name, cause } => {
                write!(
                    f,
                    "Error JSON-decoding body parameter '{}': {}",
                    name, cause
                )
            }
            BindingError::Internal { cause } => write!(f, "Internal error: {}", cause),
        }
    }
}

impl std::error::Error for BindingError {}

/// Failures that prevent the service from accepting traffic at all.
#[derive(Debug, Clone)]
pub enum StartupError {
    /// A schema document could not be compiled
    SchemaCompileFailure { schema: String, cause: String },
    /// The manifest is structurally invalid; every issue found is reported
    ManifestInvalid { issues: Vec<ValidationIssue> },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::SchemaCompileFailure { schema, cause } => {
                write!(f, "failed to compile JSON Schema '{}': {}", schema, cause)
            }
            StartupError::ManifestInvalid { issues } => {
                write!(f, "manifest validation failed, {} issue(s):", issues.len())?;
                for issue in issues {
                    write!(f, "\n  {}", issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for StartupError {}
