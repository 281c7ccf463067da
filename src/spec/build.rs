use super::load::{ManifestDocument, RawParameter, RawParameterOrRef};
use super::types::{OperationManifest, ParameterLocation, ParameterSpec, ParameterType};
use crate::error::StartupError;
use crate::validator::{fail_if_issues, ValidationIssue};
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// `{name}` segments of a path pattern.
///
/// JSF Compliance: the pattern is a literal, so compilation can only fail at the
/// first manifest build, never per request.
#[allow(clippy::expect_used)]
static PATH_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("path variable regex is valid"));

/// A resolved, validated set of operations plus the schemas their bodies use.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub operations: Vec<Arc<OperationManifest>>,
    pub schemas: BTreeMap<String, Value>,
    pub max_body_bytes: Option<usize>,
}

impl Manifest {
    pub fn operation(&self, operation_id: &str) -> Option<&Arc<OperationManifest>> {
        self.operations
            .iter()
            .find(|op| op.operation_id.as_ref() == operation_id)
    }

    /// Names of schemas referenced by at least one body parameter, deduplicated.
    pub fn referenced_schemas(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .operations
            .iter()
            .flat_map(|op| op.parameters.iter())
            .filter_map(|p| p.body_schema.as_deref())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Names of the `{variable}` segments in a path pattern, in order.
pub fn path_variables(path_pattern: &str) -> Vec<&str> {
    PATH_VARIABLE
        .captures_iter(path_pattern)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

fn resolve_parameter_ref<'a>(
    doc: &'a ManifestDocument,
    ref_path: &str,
) -> Option<&'a RawParameter> {
    ref_path
        .strip_prefix("#/parameters/")
        .and_then(|key| doc.parameters.get(key))
}

fn build_parameter(raw: &RawParameter) -> Result<ParameterSpec, String> {
    let ty = match (&raw.ty, raw.location) {
        (Some(ty), _) => ParameterType::from_type_and_format(
            ty,
            raw.format.as_deref(),
            raw.additional_properties,
        )?,
        (None, ParameterLocation::Body) if raw.additional_properties => ParameterType::Map,
        (None, ParameterLocation::Body) => ParameterType::Object,
        (None, _) => return Err("missing 'type'".to_string()),
    };
    Ok(ParameterSpec {
        name: raw.name.clone(),
        location: raw.location,
        required: raw.required,
        ty,
        format: raw.format.clone(),
        body_schema: raw.schema.clone(),
    })
}

fn check_parameter(
    spec: &ParameterSpec,
    op: &OperationManifest,
    path_vars: &[&str],
    schemas: &BTreeMap<String, Value>,
    location: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    if op.parameter(&spec.name, spec.location).is_some() {
        issues.push(ValidationIssue::new(
            location,
            "DuplicateParameter",
            format!("parameter '{}' declared twice in {}", spec.name, spec.location),
        ));
    }
    if spec.is_body() && op.body_parameter().is_some() {
        issues.push(ValidationIssue::new(
            location,
            "MultipleBodyParameters",
            format!("'{}' is a second body parameter", spec.name),
        ));
    }
    if !spec.is_body() && !spec.ty.is_scalar() {
        issues.push(ValidationIssue::new(
            location,
            "StructuredNonBodyParameter",
            format!(
                "parameter '{}' in {} has structured type {}",
                spec.name, spec.location, spec.ty
            ),
        ));
    }
    match (&spec.body_schema, spec.is_body()) {
        (Some(schema), true) if !schemas.contains_key(schema) => {
            issues.push(ValidationIssue::new(
                location,
                "UnknownSchema",
                format!("body parameter '{}' references unknown schema '{}'", spec.name, schema),
            ));
        }
        (Some(_), false) => {
            issues.push(ValidationIssue::new(
                location,
                "SchemaOnNonBodyParameter",
                format!("only body parameters may declare a schema ('{}')", spec.name),
            ));
        }
        _ => {}
    }
    if spec.location == ParameterLocation::Path && !path_vars.contains(&spec.name.as_str()) {
        issues.push(ValidationIssue::new(
            location,
            "PathParameterNotInPattern",
            format!(
                "path parameter '{}' does not appear in '{}'",
                spec.name, op.path_pattern
            ),
        ));
    }
}

/// Resolve parameter references and check a manifest document.
///
/// Every issue in the document is collected before failing so that a broken
/// manifest is reported in one pass.
///
/// # Errors
///
/// [`StartupError::ManifestInvalid`] listing every issue found.
pub fn build_manifest(doc: ManifestDocument) -> Result<Manifest, StartupError> {
    let mut issues = Vec::new();
    let mut operations = Vec::with_capacity(doc.operations.len());
    let mut seen_ids = HashSet::new();

    for raw_op in &doc.operations {
        let location = format!("{} {} ({})", raw_op.method, raw_op.path, raw_op.operation_id);

        if !seen_ids.insert(raw_op.operation_id.as_str()) {
            issues.push(ValidationIssue::new(
                &location,
                "DuplicateOperation",
                format!("operation id '{}' is declared more than once", raw_op.operation_id),
            ));
        }

        let method = match Method::from_bytes(raw_op.method.to_ascii_uppercase().as_bytes()) {
            Ok(m) => m,
            Err(_) => {
                issues.push(ValidationIssue::new(
                    &location,
                    "InvalidMethod",
                    format!("'{}' is not an HTTP method", raw_op.method),
                ));
                continue;
            }
        };

        let path_vars = path_variables(&raw_op.path);
        let mut op = OperationManifest::new(&raw_op.operation_id, method, &raw_op.path);

        for entry in &raw_op.parameters {
            let raw = match entry {
                RawParameterOrRef::Parameter(p) => p,
                RawParameterOrRef::Ref { ref_path } => match resolve_parameter_ref(&doc, ref_path) {
                    Some(p) => p,
                    None => {
                        issues.push(ValidationIssue::new(
                            &location,
                            "UnresolvedReference",
                            format!("cannot resolve parameter reference '{ref_path}'"),
                        ));
                        continue;
                    }
                },
            };
            match build_parameter(raw) {
                Ok(spec) => {
                    check_parameter(&spec, &op, &path_vars, &doc.schemas, &location, &mut issues);
                    op.parameters.push(spec);
                }
                Err(message) => issues.push(ValidationIssue::new(
                    &location,
                    "InvalidParameter",
                    format!("parameter '{}': {}", raw.name, message),
                )),
            }
        }

        tracing::debug!(
            operation_id = %op.operation_id,
            method = %op.method,
            path = %op.path_pattern,
            parameters = op.parameters.len(),
            "Operation manifest built"
        );
        operations.push(Arc::new(op));
    }

    fail_if_issues(issues)?;
    Ok(Manifest {
        operations,
        schemas: doc.schemas,
        max_body_bytes: doc.max_body_bytes,
    })
}
