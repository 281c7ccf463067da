//! # Typed Module
//!
//! Typed handlers: instead of reading [`BoundArguments`](crate::bound::BoundArguments)
//! by name, a handler declares a request struct implementing [`FromArguments`] and a
//! serializable response.
//!
//! ```rust,ignore
//! use brrtbind::typed::{arg, FromArguments, TypedHandler, TypedRequest};
//!
//! struct Products { latitude: f64, longitude: f64, max_lines: Option<i32> }
//!
//! impl FromArguments for Products {
//!     fn from_arguments(args: &BoundArguments) -> Result<Self, BindingError> {
//!         Ok(Products {
//!             latitude: arg(args, "latitude", ParameterLocation::Query)?,
//!             longitude: arg(args, "longitude", ParameterLocation::Query)?,
//!             max_lines: arg(args, "max_lines", ParameterLocation::Query)?,
//!         })
//!     }
//! }
//! ```
//!
//! A body is decoded into the handler's own `serde` type with
//! [`BoundArguments::body`](crate::bound::BoundArguments::body); a schema-valid body
//! that does not fit that type is a `BodyDecodeFailure`.

mod core;

pub use core::*;
