//! # Runtime Configuration Module
//!
//! Environment-driven configuration for the binding engine.
//!
//! ## Environment Variables
//!
//! ### `BRRTB_MAX_BODY_BYTES`
//!
//! Upper bound on the number of body bytes read per request. Accepts values in:
//! - Decimal: `1048576` (1 MiB)
//! - Hexadecimal: `0x100000` (1 MiB)
//!
//! Default: `1048576`. Unparseable values fall back to the default.
//!
//! ### `BRRTB_SCHEMA_FORMATS`
//!
//! `off` disables `format` assertions (e.g. `date-time`) during body validation.
//! Default: on.
//!
//! ## Precedence
//!
//! An explicit value (builder or CLI flag) wins over the manifest document's
//! `max_body_bytes`, which wins over the environment, which wins over the default.
//!
//! ```rust
//! use brrtbind::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Body limit: {} bytes", config.max_body_bytes);
//! ```

use std::env;

/// Default bound on request body size: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of body bytes read per request
    pub max_body_bytes: usize,
    /// Whether `format` keywords are asserted during schema validation
    pub validate_formats: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            validate_formats: true,
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_body_bytes = lookup("BRRTB_MAX_BODY_BYTES")
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);
        let validate_formats = lookup("BRRTB_SCHEMA_FORMATS")
            .map(|v| !v.eq_ignore_ascii_case("off"))
            .unwrap_or(true);
        RuntimeConfig {
            max_body_bytes,
            validate_formats,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
