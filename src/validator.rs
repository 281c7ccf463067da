//! # Validator Module
//!
//! Schema validation for request bodies and structural validation for manifests.
//!
//! - [`CompiledSchema`] wraps a `jsonschema` validator compiled once at startup.
//! - [`SchemaValidator`] is the seam the body pipeline validates through; the default
//!   [`JsonSchemaValidator`] parses the payload and collects every violation in the
//!   order `jsonschema` reports them.
//! - [`render_violations`] turns that ordered list into the single client message.
//! - [`ValidationIssue`] describes a manifest problem found while building it.

use crate::error::StartupError;
use serde_json::Value;
use std::fmt;

/// Separator between violations in a `SchemaValidationFailure` message.
pub const VIOLATION_SEPARATOR: &str = ", ";

/// Join violation descriptions in the order the validator produced them.
pub fn render_violations(violations: &[String]) -> String {
    violations.join(VIOLATION_SEPARATOR)
}

/// An immutable, compiled JSON Schema.
///
/// Built once while the service starts and then shared read-only (`Arc`) by every
/// request that validates against it.
pub struct CompiledSchema {
    name: String,
    validator: jsonschema::Validator,
}

impl CompiledSchema {
    /// Compile a schema document.
    ///
    /// # Errors
    ///
    /// [`StartupError::SchemaCompileFailure`] when the document is not a valid schema.
    pub fn compile(
        name: &str,
        document: &Value,
        validate_formats: bool,
    ) -> Result<Self, StartupError> {
        let validator = jsonschema::options()
            .should_validate_formats(validate_formats)
            .build(document)
            .map_err(|e| StartupError::SchemaCompileFailure {
                schema: name.to_string(),
                cause: e.to_string(),
            })?;
        Ok(Self {
            name: name.to_string(),
            validator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every violation of `instance`, in validator order.
    pub fn violations(&self, instance: &Value) -> Vec<String> {
        self.validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect()
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Validates a raw body payload against a compiled schema.
///
/// Returns the ordered list of violation descriptions on failure. An empty list is
/// never returned as an error.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, schema: &CompiledSchema, payload: &[u8]) -> Result<(), Vec<String>>;
}

/// Default [`SchemaValidator`] backed by the `jsonschema` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &CompiledSchema, payload: &[u8]) -> Result<(), Vec<String>> {
        let instance: Value = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => return Err(vec![format!("invalid JSON: {e}")]),
        };
        let violations = schema.violations(&instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// A problem found while building a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Log every issue and turn a non-empty list into a startup failure.
pub fn fail_if_issues(issues: Vec<ValidationIssue>) -> Result<(), StartupError> {
    if issues.is_empty() {
        return Ok(());
    }
    for issue in &issues {
        tracing::error!(
            kind = %issue.kind,
            location = %issue.location,
            message = %issue.message,
            "Manifest issue"
        );
    }
    Err(StartupError::ManifestInvalid { issues })
}
