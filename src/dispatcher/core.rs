use crate::binder::{bind_observed, BindingState};
use crate::bound::BoundArguments;
use crate::error::BindingError;
use crate::request::{BindRequest, HeaderVec};
use crate::service::BindingService;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Content type of every binding-failure response.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Content type of JSON handler responses.
pub const APPLICATION_JSON: &str = "application/json";

/// Response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Text(String),
    Json(Value),
}

/// Status, headers and body produced by a handler or by the dispatcher itself.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: ResponseBody,
}

impl HandlerResponse {
    pub fn new(status: u16, headers: HeaderVec, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Plain-text response.
    #[must_use]
    pub fn text(status: u16, message: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), TEXT_PLAIN.to_string()));
        Self::new(status, headers, ResponseBody::Text(message.into()))
    }

    /// JSON response.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), APPLICATION_JSON.to_string()));
        Self::new(status, headers, ResponseBody::Json(body))
    }

    #[must_use]
    pub fn no_content() -> Self {
        Self::new(204, HeaderVec::new(), ResponseBody::Empty)
    }

    /// Response for a binding failure: the error message as plain text, with `400`
    /// for request errors and `500` for [`BindingError::Internal`].
    #[must_use]
    pub fn binding_failure(err: &BindingError) -> Self {
        Self::text(err.status_code(), err.to_string())
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Serialized body bytes.
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            ResponseBody::Empty => Vec::new(),
            ResponseBody::Text(s) => s.as_bytes().to_vec(),
            ResponseBody::Json(v) => v.to_string().into_bytes(),
        }
    }

    /// Convert into an [`http::Response`] for the transport.
    ///
    /// # Errors
    ///
    /// Fails when a header name or value is not valid HTTP.
    pub fn into_http(self) -> Result<http::Response<Vec<u8>>, http::Error> {
        let body = self.body_bytes();
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_ref(), value.as_str());
        }
        builder.body(body)
    }
}

/// Business logic for one operation.
///
/// Receives every declared parameter, bound, in declaration order.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, args: BoundArguments) -> HandlerResponse;
}

impl<F> Handler for F
where
    F: Fn(BoundArguments) -> HandlerResponse + Send + Sync + 'static,
{
    fn handle(&self, args: BoundArguments) -> HandlerResponse {
        self(args)
    }
}

/// Routes bound requests to the handler registered for their operation.
///
/// Binding failures never reach a handler; they become a `400` with the error
/// message as the body. A missing operation or handler, a server-side binding
/// error, or a handler panic becomes a `500`.
#[derive(Clone)]
pub struct Dispatcher {
    service: BindingService,
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl Dispatcher {
    pub fn new(service: BindingService) -> Self {
        Dispatcher {
            service,
            handlers: HashMap::new(),
        }
    }

    pub fn service(&self) -> &BindingService {
        &self.service
    }

    /// Register `handler` for `operation_id`, replacing any previous one.
    pub fn register<H: Handler>(&mut self, operation_id: &str, handler: H) {
        self.register_arc(operation_id, Arc::new(handler));
    }

    pub(crate) fn register_arc(&mut self, operation_id: &str, handler: Arc<dyn Handler>) {
        if self.service.operation(operation_id).is_none() {
            warn!(
                operation_id,
                "Registering handler for an operation the manifest does not declare"
            );
        }
        if self.handlers.insert(operation_id.to_string(), handler).is_some() {
            warn!(operation_id, "Replaced existing handler");
        }
        info!(
            operation_id,
            total_handlers = self.handlers.len(),
            "Handler registered"
        );
    }

    pub fn has_handler(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Operations declared in the manifest that have no handler yet.
    pub fn unhandled_operations(&self) -> Vec<&str> {
        self.service
            .operations()
            .iter()
            .map(|op| op.operation_id.as_ref())
            .filter(|id| !self.handlers.contains_key(*id))
            .collect()
    }

    /// Bind `request` for `operation_id` and invoke its handler.
    pub fn dispatch(&self, operation_id: &str, request: BindRequest) -> HandlerResponse {
        let request_id = request.request_id;
        self.dispatch_observed(operation_id, request, &mut |state| {
            debug!(%request_id, ?state, "Binding state");
        })
    }

    /// [`dispatch`](Self::dispatch), reporting every state transition to `observer`.
    ///
    /// A run that reaches the handler ends in [`BindingState::Done`] once the
    /// response exists, including the `500` produced for a panicking handler. A
    /// binding failure ends in [`BindingState::Failed`]. Unknown operations and
    /// missing handlers are refused before the run starts.
    pub fn dispatch_observed(
        &self,
        operation_id: &str,
        mut request: BindRequest,
        observer: &mut dyn FnMut(&BindingState),
    ) -> HandlerResponse {
        let request_id = request.request_id;

        let Some(op) = self.service.operation(operation_id) else {
            error!(%request_id, operation_id, "Unknown operation");
            return HandlerResponse::text(500, format!("Unknown operation '{operation_id}'"));
        };
        let Some(handler) = self.handlers.get(operation_id) else {
            error!(%request_id, operation_id, "No handler registered");
            return HandlerResponse::text(
                500,
                format!("No handler registered for operation '{operation_id}'"),
            );
        };

        let args = match bind_observed(op, &mut request, self.service.context(), observer) {
            Ok(args) => args,
            Err(err) => return HandlerResponse::binding_failure(&err),
        };

        let started = Instant::now();
        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.handle(args)));
        let response = match outcome {
            Ok(response) => {
                info!(
                    %request_id,
                    operation_id,
                    status = response.status,
                    execution_time_ms = started.elapsed().as_millis() as u64,
                    "Handler execution complete"
                );
                response
            }
            Err(panic) => {
                let panic_message = panic_message(panic.as_ref());
                error!(
                    %request_id,
                    operation_id,
                    panic_message = %panic_message,
                    "Handler panicked"
                );
                HandlerResponse::text(500, format!("Handler panicked: {panic_message}"))
            }
        };
        observer(&BindingState::Done);
        response
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
