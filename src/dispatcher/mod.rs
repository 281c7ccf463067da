//! # Dispatcher Module
//!
//! Hands bound arguments to the handler registered for each operation.
//!
//! ## Request Flow
//!
//! 1. The transport matches a route and builds a [`BindRequest`](crate::request::BindRequest)
//! 2. The dispatcher looks up the operation and its handler by operation id
//! 3. Parameters are bound in declaration order; a failure becomes a `400 text/plain`
//!    response carrying the error message, and the handler is not called
//! 4. The handler receives the [`BoundArguments`](crate::bound::BoundArguments) and
//!    returns a [`HandlerResponse`]
//!
//! ## Error Handling
//!
//! - Unknown operations and operations without a handler return `500`
//! - Handler panics are caught and return `500`
//!
//! ```rust,ignore
//! use brrtbind::dispatcher::{Dispatcher, HandlerResponse};
//!
//! let mut dispatcher = Dispatcher::new(service);
//! dispatcher.register("products", |args: BoundArguments| {
//!     let lat = args.query("latitude").and_then(|v| v.as_f64());
//!     HandlerResponse::json(200, serde_json::json!({ "latitude": lat }))
//! });
//! ```

mod core;

pub use core::{
    Dispatcher, Handler, HandlerResponse, ResponseBody, APPLICATION_JSON, TEXT_PLAIN,
};
