use super::build::build_manifest;
use super::types::ParameterLocation;
use super::Manifest;
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Serialization of a manifest document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension; anything that isn't `.json` is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Manifest document as authored, before references are resolved and checked.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDocument {
    /// Deployment override for the body byte bound
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
    /// Named JSON Schemas, referenced by body parameters and by each other
    #[serde(default)]
    pub schemas: BTreeMap<String, Value>,
    /// Reusable parameters, referenced as `$ref: '#/parameters/<key>'`
    #[serde(default)]
    pub parameters: BTreeMap<String, RawParameter>,
    #[serde(default)]
    pub operations: Vec<RawOperation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOperation {
    pub operation_id: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub parameters: Vec<RawParameterOrRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Parameter(RawParameter),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// Body schema name
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub additional_properties: bool,
}

/// Parse a manifest document without building it.
pub fn parse_manifest_document(
    content: &str,
    format: DocumentFormat,
) -> anyhow::Result<ManifestDocument> {
    let doc = match format {
        DocumentFormat::Yaml => {
            serde_yaml::from_str(content).context("failed to parse YAML manifest")?
        }
        DocumentFormat::Json => {
            serde_json::from_str(content).context("failed to parse JSON manifest")?
        }
    };
    Ok(doc)
}

/// Load, resolve and validate a manifest from a YAML or JSON file.
pub fn load_manifest(file_path: impl AsRef<Path>) -> anyhow::Result<Manifest> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read manifest {}", file_path.display()))?;
    let manifest = load_manifest_from_str(&content, DocumentFormat::from_path(file_path))
        .with_context(|| format!("invalid manifest {}", file_path.display()))?;
    tracing::info!(
        manifest = %file_path.display(),
        operations = manifest.operations.len(),
        schemas = manifest.schemas.len(),
        "Manifest loaded"
    );
    Ok(manifest)
}

pub fn load_manifest_from_str(content: &str, format: DocumentFormat) -> anyhow::Result<Manifest> {
    let doc = parse_manifest_document(content, format)?;
    Ok(build_manifest(doc)?)
}
