//! Presence resolution and the per-request binding state machine.
//!
//! [`bind`] walks an [`OperationManifest`] in declaration order:
//!
//! ```text
//! Pending -> Extracting(i) -> Coercing(i) -> ...
//!         -> [BodyReading -> BodyValidating -> BodyDecoding]
//!         -> Dispatching -> Done
//!
//! any step before Dispatching -> Failed(error)
//! ```
//!
//! `Done` is entered by the dispatcher once the handler's response exists.
//! The first failure is terminal for the request. There is no retry transition.

use crate::body;
use crate::bound::{BoundArguments, BoundValue};
use crate::coerce::{coerce, ParamValue};
use crate::error::BindingError;
use crate::extract::Sources;
use crate::request::BindRequest;
use crate::spec::{OperationManifest, ParameterSpec};
use crate::validator::{CompiledSchema, SchemaValidator};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Where a request is in the binding process.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingState {
    Pending,
    /// Looking up parameter `i` in its location
    Extracting(usize),
    /// Converting parameter `i` to its declared type
    Coercing(usize),
    BodyReading,
    BodyValidating,
    BodyDecoding,
    /// All parameters bound; arguments are handed to the handler
    Dispatching,
    /// Handler invoked and its response produced
    Done,
    Failed(BindingError),
}

impl BindingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BindingState::Done | BindingState::Failed(_))
    }
}

/// Shared, read-only inputs for binding: compiled schemas, the validator and the
/// body bound.
#[derive(Clone, Copy)]
pub struct BindContext<'a> {
    pub schemas: &'a HashMap<String, Arc<CompiledSchema>>,
    pub validator: &'a dyn SchemaValidator,
    pub max_body_bytes: usize,
}

struct Run<'o> {
    state: BindingState,
    observer: &'o mut dyn FnMut(&BindingState),
}

impl Run<'_> {
    fn enter(&mut self, next: BindingState) {
        trace!(from = ?self.state, to = ?next, "Binding transition");
        self.state = next;
        (self.observer)(&self.state);
    }

    fn fail(&mut self, err: BindingError) -> BindingError {
        self.enter(BindingState::Failed(err.clone()));
        err
    }
}

/// Bind every declared parameter of `op` from `request`.
///
/// The body stream, if any, is taken out of `request` and consumed.
///
/// # Errors
///
/// The first [`BindingError`] encountered in declaration order.
pub fn bind(
    op: &OperationManifest,
    request: &mut BindRequest,
    ctx: BindContext<'_>,
) -> Result<BoundArguments, BindingError> {
    bind_observed(op, request, ctx, &mut |_| {})
}

/// [`bind`], reporting every state transition to `observer`.
pub fn bind_observed(
    op: &OperationManifest,
    request: &mut BindRequest,
    ctx: BindContext<'_>,
    observer: &mut dyn FnMut(&BindingState),
) -> Result<BoundArguments, BindingError> {
    let mut run = Run {
        state: BindingState::Pending,
        observer,
    };
    (run.observer)(&run.state);

    let result = bind_all(op, request, ctx, &mut run);
    match &result {
        Ok(args) => {
            run.enter(BindingState::Dispatching);
            debug!(
                request_id = %request.request_id,
                operation_id = %op.operation_id,
                arguments = args.len(),
                "Request bound"
            );
        }
        Err(err) if err.is_client_error() => {
            info!(
                request_id = %request.request_id,
                operation_id = %op.operation_id,
                kind = err.kind(),
                parameter = err.parameter_name().unwrap_or(""),
                error = %err,
                "Request rejected"
            );
        }
        Err(err) => {
            error!(
                request_id = %request.request_id,
                operation_id = %op.operation_id,
                error = %err,
                "Binding failed on server configuration"
            );
        }
    }
    result
}

fn bind_all(
    op: &OperationManifest,
    request: &mut BindRequest,
    ctx: BindContext<'_>,
    run: &mut Run<'_>,
) -> Result<BoundArguments, BindingError> {
    let mut args = BoundArguments::new(request.request_id, op.operation_id.clone());

    for (i, spec) in op.parameters.iter().enumerate() {
        run.enter(BindingState::Extracting(i));
        let value = if spec.is_body() {
            bind_body(spec, request, ctx, run)?
        } else {
            bind_scalar(i, spec, request, run)?
        };
        args.push(&spec.name, spec.location, value);
    }
    Ok(args)
}

fn bind_scalar(
    i: usize,
    spec: &ParameterSpec,
    request: &BindRequest,
    run: &mut Run<'_>,
) -> Result<BoundValue, BindingError> {
    let sources = Sources::new(request);
    let Some(raw) = sources.try_get(&spec.name, spec.location) else {
        if spec.required {
            return Err(run.fail(BindingError::missing(&spec.name, spec.location)));
        }
        debug!(parameter = %spec.name, location = %spec.location, "Optional parameter absent");
        return Ok(BoundValue::Absent);
    };

    run.enter(BindingState::Coercing(i));
    trace!(parameter = %spec.name, location = %spec.location, raw, "Coercing parameter");
    coerce(raw, spec.ty)
        .map(BoundValue::Present)
        .map_err(|e| run.fail(BindingError::malformed(&spec.name, spec.location, e.to_string())))
}

fn bind_body(
    spec: &ParameterSpec,
    request: &mut BindRequest,
    ctx: BindContext<'_>,
    run: &mut Run<'_>,
) -> Result<BoundValue, BindingError> {
    let Some(stream) = request.take_body() else {
        return absent_body(spec, run);
    };

    run.enter(BindingState::BodyReading);
    let payload = body::read_bounded(stream, ctx.max_body_bytes).map_err(|e| run.fail(e))?;
    if payload.is_empty() {
        return absent_body(spec, run);
    }

    if let Some(schema_name) = &spec.body_schema {
        run.enter(BindingState::BodyValidating);
        let Some(schema) = ctx.schemas.get(schema_name) else {
            error!(
                schema = %schema_name,
                parameter = %spec.name,
                "Body schema is not compiled"
            );
            return Err(run.fail(BindingError::internal(format!(
                "schema '{schema_name}' is not compiled"
            ))));
        };
        body::validate_against_schema(ctx.validator, schema, &payload).map_err(|e| run.fail(e))?;
    }

    run.enter(BindingState::BodyDecoding);
    body::decode_structured(&spec.name, spec.ty, &payload)
        .map(|v| BoundValue::Present(ParamValue::Json(v)))
        .map_err(|e| run.fail(e))
}

/// A missing body and a zero-length body are the same thing.
fn absent_body(spec: &ParameterSpec, run: &mut Run<'_>) -> Result<BoundValue, BindingError> {
    if spec.required {
        Err(run.fail(BindingError::missing(&spec.name, spec.location)))
    } else {
        Ok(BoundValue::Absent)
    }
}
