//! # CLI Module
//!
//! The `brrtbind` command line: validate manifests and bind one-off requests
//! without standing up a server.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Load, validate and compile a manifest; prints one line per operation.
//!
//! ```bash
//! brrtbind check --manifest manifests/products.yaml
//! ```
//!
//! ### `bind`
//!
//! Bind a request and print the bound arguments as JSON. A rejected request prints
//! the `400` message and exits with code 2.
//!
//! ```bash
//! brrtbind bind --manifest manifests/products.yaml --operation products \
//!     --query 'latitude=37.5&longitude=-122.4'
//!
//! brrtbind bind --manifest manifests/products.yaml --operation update_me \
//!     --body payload.json
//!
//! brrtbind bind --manifest manifests/products.yaml --operation test_me \
//!     --path some_parameter=42 --query some_parameter=43
//! ```

mod commands;


pub use commands::{run, run_cli, Cli, Commands, EXIT_BAD_REQUEST};
