use crate::bound::{BoundArguments, BoundValue};
use crate::coerce::ParamValue;
use crate::dispatcher::{Dispatcher, Handler, HandlerResponse};
use crate::error::BindingError;
use crate::ids::RequestId;
use crate::spec::ParameterLocation;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

/// Conversion from one bound value into a handler argument type.
///
/// `Option<T>` maps an absent optional parameter to `None`; every other type
/// requires a present value of the matching kind.
pub trait FromParamValue: Sized {
    /// Kind named in diagnostics when a present value does not convert.
    const EXPECTED: &'static str;

    fn from_bound(value: &BoundValue) -> Option<Self>;
}

macro_rules! from_param_value {
    ($ty:ty, $expected:literal, $accessor:expr) => {
        impl FromParamValue for $ty {
            const EXPECTED: &'static str = $expected;

            fn from_bound(value: &BoundValue) -> Option<Self> {
                value.value().and_then($accessor)
            }
        }
    };
}

from_param_value!(String, "string", |v: &ParamValue| v.as_str().map(str::to_string));
from_param_value!(i32, "int32", ParamValue::as_i32);
from_param_value!(i64, "int64", ParamValue::as_i64);
from_param_value!(f32, "float32", ParamValue::as_f32);
from_param_value!(f64, "float64", ParamValue::as_f64);
from_param_value!(bool, "boolean", ParamValue::as_bool);
from_param_value!(Value, "json", |v: &ParamValue| v.as_json().cloned());

impl<T: FromParamValue> FromParamValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_bound(value: &BoundValue) -> Option<Self> {
        match value {
            BoundValue::Absent => Some(None),
            present => T::from_bound(present).map(Some),
        }
    }
}

/// Read `(name, location)` from bound arguments as `T`.
///
/// # Errors
///
/// - [`BindingError::MissingRequiredParameter`] when the parameter is absent and
///   `T` is not an `Option`
/// - [`BindingError::Internal`] when the operation does not declare the parameter,
///   or its value is a kind `T` cannot be built from
pub fn arg<T: FromParamValue>(
    args: &BoundArguments,
    name: &str,
    location: ParameterLocation,
) -> Result<T, BindingError> {
    let Some(value) = args.get(name, location) else {
        return Err(BindingError::internal(format!(
            "operation '{}' does not declare parameter '{name}' in {location}",
            args.operation_id
        )));
    };
    match (T::from_bound(value), value) {
        (Some(converted), _) => Ok(converted),
        (None, BoundValue::Absent) => Err(BindingError::missing(name, location)),
        (None, BoundValue::Present(present)) => Err(BindingError::internal(format!(
            "parameter '{name}' in {location} is {}, handler expects {}",
            present.kind(),
            T::EXPECTED
        ))),
    }
}

/// Typed view over bound arguments, implemented per handler request struct.
pub trait FromArguments: Sized {
    /// # Errors
    ///
    /// A [`BindingError`] when the arguments do not fit; see
    /// [`BindingError::status_code`] for the response status.
    fn from_arguments(args: &BoundArguments) -> Result<Self, BindingError>;
}

/// Request handed to a [`TypedHandler`].
#[derive(Debug, Clone)]
pub struct TypedRequest<T> {
    pub request_id: RequestId,
    pub operation_id: Arc<str>,
    pub data: T,
}

/// Handler working on typed request data and a serializable response.
///
/// The response is sent as `200 application/json`.
pub trait TypedHandler: Send + Sync + 'static {
    type Request: FromArguments;
    type Response: Serialize;

    fn handle(&self, req: TypedRequest<Self::Request>) -> Self::Response;
}

struct TypedAdapter<H>(H);

impl<H: TypedHandler> Handler for TypedAdapter<H> {
    fn handle(&self, args: BoundArguments) -> HandlerResponse {
        let data = match H::Request::from_arguments(&args) {
            Ok(data) => data,
            Err(err) => return HandlerResponse::binding_failure(&err),
        };
        let req = TypedRequest {
            request_id: args.request_id,
            operation_id: args.operation_id.clone(),
            data,
        };
        match serde_json::to_value(self.0.handle(req)) {
            Ok(body) => HandlerResponse::json(200, body),
            Err(e) => {
                error!(
                    request_id = %args.request_id,
                    operation_id = %args.operation_id,
                    error = %e,
                    "Failed to serialize handler response"
                );
                HandlerResponse::text(500, "Failed to serialize response")
            }
        }
    }
}

impl Dispatcher {
    /// Register a typed handler for `operation_id`.
    pub fn register_typed<H: TypedHandler>(&mut self, operation_id: &str, handler: H) {
        self.register_arc(operation_id, Arc::new(TypedAdapter(handler)));
    }
}
