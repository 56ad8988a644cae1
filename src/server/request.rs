//! Request abstraction plus the URL and query-string parsers.

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

use super::headers::Headers;
use crate::error::HttpError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::router::{normalize_literal, ParamVec};

/// URI splitter: scheme, authority, path, query, fragment.
#[allow(clippy::expect_used)]
static URL_SPLITTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([^:/?#]+):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?")
        .expect("static URL splitter must compile")
});

/// Path and query of a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Path with a trailing `/`.
    pub pathname: String,
    /// Text after `?`, without the fragment.
    pub raw_query: Option<String>,
}

/// Split a request target into pathname and raw query.
///
/// Accepts origin-form (`/a/b?x=1`) and absolute (`http://host/a/b?x=1`)
/// targets. The fragment is dropped. Returns `None` when the path is empty
/// or does not start with `/`.
///
/// ```rust
/// use switchyard::server::parse_url;
///
/// let url = parse_url("http://example.com/users/42?full=1#top").unwrap();
/// assert_eq!(url.pathname, "/users/42/");
/// assert_eq!(url.raw_query.as_deref(), Some("full=1"));
/// assert!(parse_url("users/42").is_none());
/// ```
#[must_use]
pub fn parse_url(raw: &str) -> Option<ParsedUrl> {
    let captures = URL_SPLITTER.captures(raw)?;
    let path = captures.get(5).map_or("", |m| m.as_str());
    if !path.starts_with('/') {
        return None;
    }
    Some(ParsedUrl {
        pathname: normalize_literal(path).into_owned(),
        raw_query: captures.get(7).map(|m| m.as_str().to_string()),
    })
}

/// Decode an `application/x-www-form-urlencoded` style query string.
///
/// Pairs are split on `&` and then on the first `=`; `+` means space and
/// percent escapes are decoded (invalid UTF-8 is replaced, never rejected).
/// A key without `=` maps to an empty string. Repeated keys keep the last
/// value.
#[must_use]
pub fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Request flowing through hooks and handlers.
///
/// `pathname` may be rewritten by `preRoute` hooks before the root lookup.
/// `query` is only filled once a route with query parsing enabled is about
/// to run; until then it is empty and `raw_query` holds the text.
#[derive(Debug)]
pub struct Request {
    pub id: RequestId,
    pub method: Method,
    /// Original request target.
    pub url: String,
    pub pathname: String,
    pub raw_query: Option<String>,
    pub query: HashMap<String, String>,
    /// Path parameters of the matched pattern route.
    pub params: ParamVec,
    pub headers: Headers,
    pub body: Vec<u8>,
    /// Typed data attached by hooks for later hooks and handlers.
    pub extensions: http::Extensions,
}

impl Request {
    /// Build a request from a method and target.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`HttpError`] if the target has no usable path.
    pub fn new(method: Method, url: &str) -> Result<Self, HttpError> {
        let parsed = parse_url(url).ok_or_else(|| HttpError::bad_request("Malformed URL"))?;
        Ok(Self {
            id: RequestId::new(),
            method,
            url: url.to_string(),
            pathname: parsed.pathname,
            raw_query: parsed.raw_query,
            query: HashMap::new(),
            params: ParamVec::new(),
            headers: Headers::new(),
            body: Vec::new(),
            extensions: http::Extensions::new(),
        })
    }

    /// Convert a wire request. Header values that are not valid UTF-8 are
    /// skipped. A valid ULID in `x-request-id` becomes the request id.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`HttpError`] if the target has no usable path.
    pub fn from_http(req: http::Request<Vec<u8>>) -> Result<Self, HttpError> {
        let (parts, body) = req.into_parts();
        let mut request = Self::new(parts.method, &parts.uri.to_string())?;
        for (name, value) in &parts.headers {
            match value.to_str() {
                Ok(v) => request.headers.append(name.as_str(), v),
                Err(_) => debug!(header = %name, "Skipping non UTF-8 header value"),
            }
        }
        request.id = RequestId::from_header_or_new(request.headers.get(REQUEST_ID_HEADER));
        request.body = body;
        request.extensions = parts.extensions;
        Ok(request)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Path parameter by name. Later entries win over earlier ones.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parsed query value by name.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
