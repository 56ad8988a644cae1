//! # Runtime Configuration Module
//!
//! Environment-driven defaults for switchyard.
//!
//! ## Environment Variables
//!
//! ### `SWITCHYARD_PARSE_QUERY`
//!
//! Whether routes parse the query string into `Request::query` before their
//! handler runs. Individual routes can override it through `RouteConfig`.
//!
//! Default: `true`
//!
//! ### `SWITCHYARD_ECHO_REQUEST_ID`
//!
//! When enabled, `App` copies the request id into an `x-request-id`
//! response header.
//!
//! Default: `false`
//!
//! Booleans accept `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`
//! (case-insensitive). Anything else falls back to the default.
//!
//! ## Usage
//!
//! ```rust
//! use switchyard::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("parse query: {}", config.parse_query);
//! ```

use std::env;
use tracing::warn;

pub const PARSE_QUERY_ENV: &str = "SWITCHYARD_PARSE_QUERY";
pub const ECHO_REQUEST_ID_ENV: &str = "SWITCHYARD_ECHO_REQUEST_ID";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Default query parsing for routes (default: true)
    pub parse_query: bool,
    /// Echo the request id as a response header (default: false)
    pub echo_request_id: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parse_query: true,
            echo_request_id: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup, e.g. a map in tests.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            parse_query: read_bool(&lookup, PARSE_QUERY_ENV, defaults.parse_query),
            echo_request_id: read_bool(&lookup, ECHO_REQUEST_ID_ENV, defaults.echo_request_id),
        }
    }
}

fn read_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match parse_bool(&raw) {
        Some(value) => value,
        None => {
            warn!(key = key, value = %raw, default = default, "Invalid boolean, using default");
            default
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
