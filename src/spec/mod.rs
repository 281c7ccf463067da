//! # Manifest Module
//!
//! Declarative operation manifests: the parameters each operation expects, where they
//! live in the request, their types, and the schema a body must satisfy.
//!
//! Manifests are loaded once ([`load_manifest`]), checked as a whole
//! ([`build_manifest`]) and are immutable afterwards.

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
