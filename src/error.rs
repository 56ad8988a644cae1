//! # Error Module
//!
//! Two kinds of errors live here:
//!
//! - [`HttpError`]: a *classified* HTTP failure. Handlers and hooks raise it
//!   (usually with `?` or `Err(HttpError::not_found("..").into())`) to pick the
//!   status and body of the response. It is the only condition the dispatch
//!   engine treats specially; every other raised error becomes a generic 500.
//! - [`PatternError`] / [`RouteError`]: registration-time failures, returned
//!   from the route registration surface before any request is served.
//!
//! ## Example
//!
//! ```rust
//! use switchyard::error::HttpError;
//!
//! let err = HttpError::not_found("missing");
//! assert_eq!(err.status(), 404);
//! assert_eq!(err.message(), "missing");
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::server::Response;

/// Message used when an [`HttpError`] is built without one, or when a
/// structured payload cannot be serialised.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred.";

/// Classified HTTP error carrying a status code and a response message.
///
/// Immutable once constructed. The default status is 500.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    status: u16,
    message: String,
}

impl HttpError {
    /// Create an error with status 500 and the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(500, message)
    }

    /// Create an error with an explicit status.
    #[must_use]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create an error whose message is the JSON serialisation of `payload`.
    ///
    /// Serialisation failure never propagates: it is logged and the message
    /// falls back to [`DEFAULT_ERROR_MESSAGE`].
    #[must_use]
    pub fn from_json<T: Serialize + ?Sized>(status: u16, payload: &T) -> Self {
        let message = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                error!(status = status, error = %e, "Error serializing message into json");
                DEFAULT_ERROR_MESSAGE.to_string()
            }
        };
        Self { status, message }
    }

    /// HTTP status code.
    #[inline]
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Message used as the response body.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Default response for this error: its status and its message as a
    /// `text/plain` body.
    #[must_use]
    pub fn to_response(&self) -> Response {
        Response::text(self.status, self.message.clone())
    }
}

impl Default for HttpError {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_MESSAGE)
    }
}

macro_rules! status_constructors {
    ($($(#[$doc:meta])* $name:ident => $status:expr;)*) => {
        impl HttpError {
            $(
                $(#[$doc])*
                #[must_use]
                pub fn $name(message: impl Into<String>) -> Self {
                    Self::with_status($status, message)
                }
            )*
        }
    };
}

status_constructors! {
    /// 400 Bad Request
    bad_request => 400;
    /// 401 Unauthorized
    unauthorized => 401;
    /// 402 Payment Required
    payment_required => 402;
    /// 403 Forbidden
    forbidden => 403;
    /// 404 Not Found
    not_found => 404;
    /// 405 Method Not Allowed
    method_not_allowed => 405;
    /// 406 Not Acceptable
    not_acceptable => 406;
    /// 407 Proxy Authentication Required
    proxy_authentication_required => 407;
    /// 408 Request Timeout
    request_timeout => 408;
    /// 409 Conflict
    conflict => 409;
    /// 410 Gone
    gone => 410;
    /// 411 Length Required
    length_required => 411;
    /// 412 Precondition Failed
    precondition_failed => 412;
    /// 413 Payload Too Large
    payload_too_large => 413;
    /// 414 URI Too Long
    uri_too_long => 414;
    /// 415 Unsupported Media Type
    unsupported_media_type => 415;
    /// 416 Range Not Satisfiable
    range_not_satisfiable => 416;
    /// 418 I'm a teapot
    im_a_teapot => 418;
    /// 422 Unprocessable Entity
    unprocessable_entity => 422;
    /// 426 Upgrade Required
    upgrade_required => 426;
    /// 428 Precondition Required
    precondition_required => 428;
    /// 429 Too Many Requests
    too_many_requests => 429;
    /// 431 Request Header Fields Too Large
    request_header_fields_too_large => 431;
    /// 451 Unavailable For Legal Reasons
    unavailable_for_legal_reasons => 451;
    /// 500 Internal Server Error
    internal => 500;
    /// 501 Not Implemented
    not_implemented => 501;
    /// 502 Bad Gateway
    bad_gateway => 502;
    /// 503 Service Unavailable
    service_unavailable => 503;
    /// 504 Gateway Timeout
    gateway_timeout => 504;
    /// 505 HTTP Version Not Supported
    http_version_not_supported => 505;
    /// 506 Variant Also Negotiates
    variant_also_negotiates => 506;
    /// 507 Insufficient Storage
    insufficient_storage => 507;
    /// 508 Loop Detected
    loop_detected => 508;
    /// 510 Not Extended
    not_extended => 510;
    /// 511 Network Authentication Required
    network_authentication_required => 511;
}

/// Invalid path template passed to [`Pattern::compile`](crate::router::Pattern::compile).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    /// The template was empty.
    #[error("path template is empty")]
    Empty,
    /// The template contains `//`.
    #[error("path template '{template}' contains adjacent separators")]
    AdjacentSeparators {
        /// The offending template
        template: String,
    },
    /// A `:` marker is not followed by a usable parameter name.
    #[error("path template '{template}' has an invalid parameter name '{name}'")]
    InvalidParameterName {
        /// The offending template
        template: String,
        /// The name after the marker (possibly empty)
        name: String,
    },
    /// The same parameter name appears twice.
    #[error("path template '{template}' repeats parameter '{name}'")]
    DuplicateParameter {
        /// The offending template
        template: String,
        /// The repeated name
        name: String,
    },
    /// The generated matcher failed to compile.
    #[error("path template '{template}' did not compile: {source}")]
    Regex {
        /// The offending template
        template: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// Failure while registering a route.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path looked like a parameter template but did not compile.
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] PatternError),
    /// A literal path was empty.
    #[error("route path must not be empty")]
    EmptyPath,
    /// A plugin failed to install.
    #[error("plugin failed to install: {0}")]
    Plugin(#[source] anyhow::Error),
}
