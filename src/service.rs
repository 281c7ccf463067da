//! # Binding Service
//!
//! Process-wide, read-only binding state: the operation table, the compiled body
//! schemas, the schema validator and the effective body limit.
//!
//! Everything is built once by [`BindingServiceBuilder::build`] and never mutated
//! afterwards, so a [`BindingService`] can be cloned into every worker and read
//! concurrently without locks. [`install_global`] stores one instance in an
//! init-once cell for code that has no handle to pass around.
//!
//! ## Schema compilation
//!
//! Each schema referenced by a body parameter is compiled as a draft-04 document
//! that carries every manifest schema under `definitions`:
//!
//! ```json
//! {
//!   "$schema": "http://json-schema.org/draft-04/schema#",
//!   "title": "Profile",
//!   "definitions": { "Profile": { ... }, "Address": { ... } },
//!   "$ref": "#/definitions/Profile"
//! }
//! ```
//!
//! so that schemas can refer to one another through `#/definitions/<Name>`.
//! A schema that fails to compile stops startup.

use crate::binder::{self, BindContext};
use crate::bound::BoundArguments;
use crate::error::{BindingError, StartupError};
use crate::request::BindRequest;
use crate::runtime_config::RuntimeConfig;
use crate::spec::{load_manifest, Manifest, OperationManifest};
use crate::validator::{CompiledSchema, JsonSchemaValidator, SchemaValidator};
use anyhow::Context;
use once_cell::sync::OnceCell;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// `$schema` URI every body schema is compiled under.
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-04/schema#";

static GLOBAL: OnceCell<BindingService> = OnceCell::new();

/// Wrap one named schema into a self-contained draft-04 document.
pub fn schema_document(name: &str, all: &BTreeMap<String, Value>) -> Value {
    let definitions: Map<String, Value> = all
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    json!({
        "$schema": SCHEMA_DIALECT,
        "title": name,
        "definitions": definitions,
        "$ref": format!("#/definitions/{name}"),
    })
}

/// Compile every schema a body parameter refers to.
///
/// # Errors
///
/// [`StartupError::SchemaCompileFailure`] for the first schema that does not compile.
pub fn compile_schemas(
    manifest: &Manifest,
    validate_formats: bool,
) -> Result<HashMap<String, Arc<CompiledSchema>>, StartupError> {
    let mut compiled = HashMap::new();
    for name in manifest.referenced_schemas() {
        let document = schema_document(name, &manifest.schemas);
        let schema = CompiledSchema::compile(name, &document, validate_formats)?;
        debug!(schema = name, "Schema compiled");
        compiled.insert(name.to_string(), Arc::new(schema));
    }
    Ok(compiled)
}

/// Read-only binding engine shared by all request workers.
#[derive(Clone)]
pub struct BindingService {
    operations: Arc<Vec<Arc<OperationManifest>>>,
    by_id: Arc<HashMap<Arc<str>, Arc<OperationManifest>>>,
    schemas: Arc<HashMap<String, Arc<CompiledSchema>>>,
    validator: Arc<dyn SchemaValidator>,
    max_body_bytes: usize,
}

/// Builder for [`BindingService`].
///
/// The body limit resolves as: [`max_body_bytes`](Self::max_body_bytes) if set,
/// else the manifest's `max_body_bytes`, else the runtime config (environment or
/// default).
pub struct BindingServiceBuilder {
    manifest: Manifest,
    config: RuntimeConfig,
    max_body_bytes: Option<usize>,
    validator: Arc<dyn SchemaValidator>,
}

impl BindingServiceBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    /// Replace the default `jsonschema`-backed validator.
    pub fn validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Compile schemas and freeze the operation table.
    ///
    /// # Errors
    ///
    /// [`StartupError::SchemaCompileFailure`] if any referenced schema is malformed.
    pub fn build(self) -> Result<BindingService, StartupError> {
        let schemas = compile_schemas(&self.manifest, self.config.validate_formats)?;
        let max_body_bytes = self
            .max_body_bytes
            .or(self.manifest.max_body_bytes)
            .unwrap_or(self.config.max_body_bytes);

        let by_id = self
            .manifest
            .operations
            .iter()
            .map(|op| (op.operation_id.clone(), op.clone()))
            .collect::<HashMap<_, _>>();

        info!(
            operations = self.manifest.operations.len(),
            schemas = schemas.len(),
            max_body_bytes,
            validate_formats = self.config.validate_formats,
            "Binding service ready"
        );

        Ok(BindingService {
            operations: Arc::new(self.manifest.operations),
            by_id: Arc::new(by_id),
            schemas: Arc::new(schemas),
            validator: self.validator,
            max_body_bytes,
        })
    }
}

impl BindingService {
    /// Start building a service for `manifest` with environment configuration.
    pub fn builder(manifest: Manifest) -> BindingServiceBuilder {
        BindingServiceBuilder {
            manifest,
            config: RuntimeConfig::from_env(),
            max_body_bytes: None,
            validator: Arc::new(JsonSchemaValidator),
        }
    }

    /// Build a service with default settings.
    ///
    /// # Errors
    ///
    /// See [`BindingServiceBuilder::build`].
    pub fn new(manifest: Manifest) -> Result<Self, StartupError> {
        Self::builder(manifest).build()
    }

    /// Load a manifest file and build a service from it.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let manifest = load_manifest(path)?;
        Self::new(manifest)
            .with_context(|| format!("failed to start binding service for {}", path.display()))
    }

    /// Operations in manifest order.
    pub fn operations(&self) -> &[Arc<OperationManifest>] {
        &self.operations
    }

    pub fn operation(&self, operation_id: &str) -> Option<&Arc<OperationManifest>> {
        self.by_id.get(operation_id)
    }

    pub fn schema(&self, name: &str) -> Option<&Arc<CompiledSchema>> {
        self.schemas.get(name)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Bind `request` against `op`.
    ///
    /// # Errors
    ///
    /// The first [`BindingError`] in declaration order.
    pub fn bind(
        &self,
        op: &OperationManifest,
        request: &mut BindRequest,
    ) -> Result<BoundArguments, BindingError> {
        binder::bind(op, request, self.context())
    }

    pub(crate) fn context(&self) -> BindContext<'_> {
        BindContext {
            schemas: &self.schemas,
            validator: self.validator.as_ref(),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl fmt::Debug for BindingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingService")
            .field("operations", &self.operations.len())
            .field("schemas", &self.schemas.len())
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Install the process-wide service. Only the first call succeeds.
pub fn install_global(service: BindingService) -> anyhow::Result<&'static BindingService> {
    GLOBAL
        .set(service)
        .map_err(|_| anyhow::anyhow!("a global binding service is already installed"))?;
    global().context("global binding service vanished after install")
}

/// The process-wide service, if one was installed.
pub fn global() -> Option<&'static BindingService> {
    GLOBAL.get()
}
