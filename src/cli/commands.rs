use crate::request::{BindRequest, BodyStream};
use crate::runtime_config::RuntimeConfig;
use crate::service::BindingService;
use crate::spec::load_manifest;
use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Exit code of `bind` when the request is rejected with a 400.
pub const EXIT_BAD_REQUEST: i32 = 2;

/// Command-line interface for the binding engine
#[derive(Parser)]
#[command(name = "brrtbind")]
#[command(about = "Manifest-driven request binding and validation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load, validate and compile a manifest
    Check {
        /// Manifest file (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        manifest: PathBuf,
    },
    /// Bind one request against an operation and print the arguments as JSON
    Bind {
        #[arg(short, long)]
        manifest: PathBuf,

        /// Operation id to bind against
        #[arg(short, long)]
        operation: String,

        /// Path variable as name=value (repeatable)
        #[arg(long = "path", value_name = "NAME=VALUE")]
        path_params: Vec<String>,

        /// Raw query string, e.g. 'latitude=37.5&longitude=-122.4'
        #[arg(short, long)]
        query: Option<String>,

        /// Header as 'Name: value' (repeatable)
        #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
        headers: Vec<String>,

        /// Body file, or '-' for stdin
        #[arg(short, long)]
        body: Option<PathBuf>,

        /// Override the body size limit
        #[arg(long)]
        max_body_bytes: Option<usize>,
    },
}

pub(crate) fn parse_path_param(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| anyhow!("path parameter must look like name=value, got '{raw}'"))
}

pub(crate) fn parse_header(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once(':')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| anyhow!("header must look like 'Name: value', got '{raw}'"))
}

fn open_body(path: &Path) -> anyhow::Result<BodyStream> {
    if path == Path::new("-") {
        return Ok(BodyStream::from_reader(io::stdin()));
    }
    let file = File::open(path)
        .with_context(|| format!("failed to open body file {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("failed to stat body file {}", path.display()))?
        .len();
    Ok(BodyStream::from_reader(file).with_content_length(len))
}

fn check(manifest: &Path, out: &mut dyn Write) -> anyhow::Result<i32> {
    let loaded = load_manifest(manifest)?;
    let service = BindingService::builder(loaded)
        .build()
        .with_context(|| format!("failed to compile schemas for {}", manifest.display()))?;
    for op in service.operations() {
        let body = op
            .body_parameter()
            .and_then(|p| p.body_schema.as_deref())
            .map(|s| format!(", body schema {s}"))
            .unwrap_or_default();
        writeln!(
            out,
            "{} {} ({}): {} parameter(s){}",
            op.method,
            op.path_pattern,
            op.operation_id,
            op.parameters.len(),
            body
        )?;
    }
    writeln!(
        out,
        "OK: {} operation(s), body limit {} bytes",
        service.operations().len(),
        service.max_body_bytes()
    )?;
    Ok(0)
}

#[allow(clippy::too_many_arguments)]
fn bind(
    manifest: &Path,
    operation: &str,
    path_params: &[String],
    query: Option<&str>,
    headers: &[String],
    body: Option<&Path>,
    max_body_bytes: Option<usize>,
    out: &mut dyn Write,
) -> anyhow::Result<i32> {
    let loaded = load_manifest(manifest)?;
    let mut builder = BindingService::builder(loaded).config(RuntimeConfig::from_env());
    if let Some(limit) = max_body_bytes {
        builder = builder.max_body_bytes(limit);
    }
    let service = builder.build()?;
    let Some(op) = service.operation(operation) else {
        bail!("operation '{operation}' is not declared in {}", manifest.display());
    };

    let target = match query {
        Some(q) => format!("{}?{}", op.path_pattern, q.trim_start_matches('?')),
        None => op.path_pattern.to_string(),
    };
    let mut request = BindRequest::new(op.method.clone(), &target);
    for raw in path_params {
        let (name, value) = parse_path_param(raw)?;
        request = request.with_path_param(name, value);
    }
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }
    if let Some(path) = body {
        request = request.with_body(open_body(path)?);
    }

    match service.bind(op, &mut request) {
        Ok(args) => {
            let rendered = json!({
                "operation_id": args.operation_id.as_ref(),
                "request_id": args.request_id.to_string(),
                "arguments": args.to_json(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&rendered)?)?;
            Ok(0)
        }
        Err(err) if err.is_client_error() => {
            writeln!(out, "{} Bad Request: {}", err.status_code(), err)?;
            Ok(EXIT_BAD_REQUEST)
        }
        Err(err) => {
            Err(anyhow!(err).context(format!("failed to bind operation '{}'", op.operation_id)))
        }
    }
}

/// Run a parsed command, writing its output to `out`. Returns the process exit code.
pub fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Check { manifest } => check(manifest, out),
        Commands::Bind {
            manifest,
            operation,
            path_params,
            query,
            headers,
            body,
            max_body_bytes,
        } => bind(
            manifest,
            operation,
            path_params,
            query.as_deref(),
            headers,
            body.as_deref(),
            *max_body_bytes,
            out,
        ),
    }
}

/// Parse the process arguments and run.
pub fn run_cli() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    run(cli, &mut io::stdout().lock())
}
