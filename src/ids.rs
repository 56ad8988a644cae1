//! Request ids.
//!
//! Every [`Request`](crate::server::Request) gets a [`RequestId`] when it is
//! built. Log events from the dispatcher, the error path and the built-in
//! plugins carry it as `request_id`, and [`App`](crate::server::App) can
//! echo it back in the [`REQUEST_ID_HEADER`] response header.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Header read on incoming requests and written when echoing is enabled.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ULID identifying one request across hooks, handlers and logs.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse the caller's id from [`REQUEST_ID_HEADER`] when it is a valid
    /// ULID, so a proxy's id survives into our logs. Anything else gets a
    /// fresh id.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.trim().parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(RequestId(id))
    }
}
