//! # brrtbind
//!
//! **brrtbind** binds incoming HTTP request data to typed handler arguments, driven by a
//! declarative operation manifest. It locates every declared parameter in the request
//! (path, query, header or body), enforces required/optional semantics, coerces raw
//! text into typed values and validates JSON bodies against a compiled schema before
//! decoding them.
//!
//! One engine interprets the manifest at request time; nothing is generated per endpoint.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Manifest types, loading (YAML/JSON) and build-time validation
//! - **[`request`]** - Transport-neutral request view and the owned body stream
//! - **[`extract`]** - Per-location lookup of raw values
//! - **[`coerce`]** - Raw text to typed values
//! - **[`body`]** - Bounded body read, schema validation and structural decode
//! - **[`validator`]** - Compiled JSON Schemas and the validator seam
//! - **[`binder`]** - Presence resolution and the per-request state machine
//! - **[`bound`]** - Ordered binding results
//! - **[`service`]** - Process-wide, read-only binding state
//! - **[`dispatcher`]** / **[`typed`]** - Handler invocation
//!
//! ### Binding Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant D as dispatcher::Dispatcher
//!     participant B as binder::bind
//!     participant X as extract::Sources
//!     participant C as coerce::coerce
//!     participant P as body pipeline
//!     participant H as Handler
//!
//!     T->>D: dispatch(operation_id, BindRequest)
//!     D->>B: bind(manifest, request)
//!     loop each parameter, declaration order
//!         B->>X: try_get(name, location)
//!         X-->>B: raw value or absent
//!         B->>C: coerce(raw, type)
//!     end
//!     B->>P: read_bounded, validate, decode
//!     alt any failure
//!         B-->>D: BindingError
//!         D-->>T: 400 text/plain
//!     else bound
//!         B-->>D: BoundArguments
//!         D->>H: handle(args)
//!         H-->>T: HandlerResponse
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brrtbind::dispatcher::{Dispatcher, HandlerResponse};
//! use brrtbind::request::BindRequest;
//! use brrtbind::service::BindingService;
//! use http::Method;
//!
//! # fn main() -> anyhow::Result<()> {
//! let service = BindingService::from_path("manifests/products.yaml")?;
//! let mut dispatcher = Dispatcher::new(service);
//! dispatcher.register("products", |args: brrtbind::bound::BoundArguments| {
//!     let lat = args.query("latitude").and_then(|v| v.as_f64());
//!     HandlerResponse::json(200, serde_json::json!({ "latitude": lat }))
//! });
//!
//! let request = BindRequest::new(Method::GET, "/products?latitude=37.5&longitude=-122.4");
//! let response = dispatcher.dispatch("products", request);
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```
//!
//! ## Client Errors
//!
//! Every binding failure is a `400` whose plain-text body is exactly one of:
//!
//! - `Parameter '<name>' expected in <location>`
//! - `Parameter '<name>': <parse error>`
//! - `Body unreadable: <error>`
//! - `Failed to validate against schema: <violation>, <violation>, ...`
//! - `Error JSON-decoding body parameter '<name>': <error>`

pub mod binder;
pub mod body;
pub mod bound;
pub mod cli;
pub mod coerce;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod ids;
pub mod logging;
pub mod request;
pub mod runtime_config;
pub mod service;
pub mod spec;
pub mod typed;
pub mod validator;

pub use bound::{BoundArgument, BoundArguments, BoundValue};
pub use coerce::ParamValue;
pub use error::{BindingError, StartupError};
pub use request::BindRequest;
pub use service::BindingService;
pub use spec::{
    load_manifest, Manifest, OperationManifest, ParameterLocation, ParameterSpec, ParameterType,
};
