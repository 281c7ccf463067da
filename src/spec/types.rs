use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where in the request a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParameterLocation {
    /// Lowercase name used in client-facing error messages (`expected in query`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Body => "body",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a parameter after `type`/`format` resolution.
///
/// Scalar types are produced by the coercers from raw text. `Object`, `Array` and
/// `Map` only ever come from a JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    Object,
    Array,
    Map,
}

impl ParameterType {
    /// `true` for types that can be coerced from a single raw string.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            ParameterType::Object | ParameterType::Array | ParameterType::Map
        )
    }

    /// Resolve an OpenAPI-style `type` / `format` pair.
    ///
    /// Integers without a format are 64-bit, numbers without a format are 64-bit
    /// floats. `object` becomes [`ParameterType::Map`] when the parameter declares
    /// additional properties instead of a fixed shape.
    pub fn from_type_and_format(
        ty: &str,
        format: Option<&str>,
        additional_properties: bool,
    ) -> Result<Self, String> {
        match (ty, format) {
            ("string", _) => Ok(ParameterType::String),
            ("integer", None) | ("integer", Some("int64")) => Ok(ParameterType::Int64),
            ("integer", Some("int32")) => Ok(ParameterType::Int32),
            ("number", None) | ("number", Some("double")) => Ok(ParameterType::Float64),
            ("number", Some("float")) => Ok(ParameterType::Float32),
            ("integer", Some(other)) | ("number", Some(other)) => {
                Err(format!("unexpected format '{other}' for type '{ty}'"))
            }
            ("boolean", _) => Ok(ParameterType::Boolean),
            ("object", _) if additional_properties => Ok(ParameterType::Map),
            ("object", _) => Ok(ParameterType::Object),
            ("array", _) => Ok(ParameterType::Array),
            (other, _) => Err(format!("unsupported parameter type '{other}'")),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterType::String => "string",
            ParameterType::Int32 => "int32",
            ParameterType::Int64 => "int64",
            ParameterType::Float32 => "float32",
            ParameterType::Float64 => "float64",
            ParameterType::Boolean => "boolean",
            ParameterType::Object => "object",
            ParameterType::Array => "array",
            ParameterType::Map => "map",
        };
        write!(f, "{}", s)
    }
}

/// One declared parameter of an operation.
///
/// `(name, location)` identifies a parameter; the same `name` may appear once per
/// location.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub ty: ParameterType,
    pub format: Option<String>,
    /// Name of the schema (in the manifest's `schemas` section) the body is validated against
    pub body_schema: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, location: ParameterLocation, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
            ty,
            format: None,
            body_schema: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.body_schema = Some(schema.into());
        self
    }

    pub fn is_body(&self) -> bool {
        self.location == ParameterLocation::Body
    }
}

/// Declarative description of one operation.
///
/// Immutable once built; shared across requests behind an `Arc`.
#[derive(Debug, Clone)]
pub struct OperationManifest {
    pub operation_id: Arc<str>,
    pub method: Method,
    pub path_pattern: Arc<str>,
    pub parameters: Vec<ParameterSpec>,
}

impl OperationManifest {
    pub fn new(operation_id: &str, method: Method, path_pattern: &str) -> Self {
        Self {
            operation_id: Arc::from(operation_id),
            method,
            path_pattern: Arc::from(path_pattern),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// The body parameter, if the operation declares one.
    pub fn body_parameter(&self) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.is_body())
    }

    pub fn parameter(&self, name: &str, location: ParameterLocation) -> Option<&ParameterSpec> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }
}
