//! Routes: one logical path, many method handlers.

use futures::future::BoxFuture;
use http::Method;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::pattern::{Pattern, PARAM_MARKER};
use crate::dispatcher::{BoxedHandler, HandlerResult};
use crate::error::RouteError;
use crate::server::{parse_query, Request};

/// Literal path tried last, as a catch-all.
pub const WILDCARD_PATH: &str = "*";

/// Free-form per-route metadata handed to `preHandle` / `postHandle` hooks.
pub type Metadata = HashMap<String, Value>;

/// Method slot a handler is registered under.
///
/// `Any` is the sentinel fallback used when no explicit slot matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Any,
}

impl RouteMethod {
    /// Number of slots in a route's handler table.
    pub const COUNT: usize = 7;

    /// All slots, in table order.
    pub const ALL: [RouteMethod; Self::COUNT] = [
        RouteMethod::Get,
        RouteMethod::Post,
        RouteMethod::Put,
        RouteMethod::Patch,
        RouteMethod::Delete,
        RouteMethod::Options,
        RouteMethod::Any,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    /// Map a request method onto an explicit slot.
    ///
    /// Methods without a slot (HEAD, TRACE, CONNECT, extensions) return `None`
    /// and can only be served by `Any` handlers.
    #[must_use]
    pub fn from_http(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(RouteMethod::Get),
            Method::POST => Some(RouteMethod::Post),
            Method::PUT => Some(RouteMethod::Put),
            Method::PATCH => Some(RouteMethod::Patch),
            Method::DELETE => Some(RouteMethod::Delete),
            Method::OPTIONS => Some(RouteMethod::Options),
            _ => None,
        }
    }

    /// Upper-case token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Patch => "PATCH",
            RouteMethod::Delete => "DELETE",
            RouteMethod::Options => "OPTIONS",
            RouteMethod::Any => "ANY",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Path descriptor of a route. Exactly one kind, decided at registration.
#[derive(Debug, Clone)]
pub enum RoutePath {
    /// Exact string, stored with a trailing `/` (except the wildcard `*`).
    Literal(String),
    /// Parameterized template.
    Pattern(Pattern),
    /// Regular expression, tested unanchored against the lookup path.
    Regex(Regex),
}

impl RoutePath {
    /// Build a literal path, normalising the trailing separator.
    ///
    /// # Errors
    ///
    /// Fails on an empty path.
    pub fn literal(path: &str) -> Result<Self, RouteError> {
        if path.is_empty() {
            return Err(RouteError::EmptyPath);
        }
        Ok(RoutePath::Literal(normalize_literal(path).into_owned()))
    }

    /// Storage key inside the owning table.
    ///
    /// Literal paths use their normalised form, patterns their template
    /// without trailing separator, regexes their source string.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            RoutePath::Literal(path) => path,
            RoutePath::Pattern(pattern) => {
                let template = pattern.template();
                match template.strip_suffix('/') {
                    Some(stripped) if !stripped.is_empty() => stripped,
                    _ => template,
                }
            }
            RoutePath::Regex(regex) => regex.as_str(),
        }
    }

    /// Short name of the variant, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RoutePath::Literal(_) => "literal",
            RoutePath::Pattern(_) => "pattern",
            RoutePath::Regex(_) => "regex",
        }
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Append a trailing `/` to a literal path unless it already has one.
///
/// The wildcard `*` is left untouched.
#[must_use]
pub fn normalize_literal(path: &str) -> Cow<'_, str> {
    if path == WILDCARD_PATH || path.ends_with('/') {
        Cow::Borrowed(path)
    } else {
        let mut owned = String::with_capacity(path.len() + 1);
        owned.push_str(path);
        owned.push('/');
        Cow::Owned(owned)
    }
}

/// Anything the registration surface accepts as a path.
///
/// Strings are inspected: a `:` makes them a [`Pattern`], otherwise they are
/// literal. [`Regex`] values become regex routes.
pub trait IntoRoutePath {
    /// Convert into a [`RoutePath`].
    ///
    /// # Errors
    ///
    /// Fails for an empty string or an invalid template.
    fn into_route_path(self) -> Result<RoutePath, RouteError>;
}

impl IntoRoutePath for RoutePath {
    fn into_route_path(self) -> Result<RoutePath, RouteError> {
        Ok(self)
    }
}

impl IntoRoutePath for &str {
    fn into_route_path(self) -> Result<RoutePath, RouteError> {
        if self.contains(PARAM_MARKER) {
            Ok(RoutePath::Pattern(Pattern::compile(self)?))
        } else {
            RoutePath::literal(self)
        }
    }
}

impl IntoRoutePath for String {
    fn into_route_path(self) -> Result<RoutePath, RouteError> {
        self.as_str().into_route_path()
    }
}

impl IntoRoutePath for &String {
    fn into_route_path(self) -> Result<RoutePath, RouteError> {
        self.as_str().into_route_path()
    }
}

impl IntoRoutePath for Pattern {
    fn into_route_path(self) -> Result<RoutePath, RouteError> {
        Ok(RoutePath::Pattern(self))
    }
}

impl IntoRoutePath for Regex {
    fn into_route_path(self) -> Result<RoutePath, RouteError> {
        Ok(RoutePath::Regex(self))
    }
}

/// Per-registration options; unset fields fall back to the owner's defaults.
#[derive(Debug, Clone, Default)]
pub struct RouteConfig {
    /// Parse the raw query string before calling the handler.
    pub parse_query: Option<bool>,
    /// Metadata handed to hooks when this handler is selected.
    pub metadata: Metadata,
}

impl RouteConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the owner's query-parsing default.
    #[must_use]
    pub fn parse_query(mut self, enabled: bool) -> Self {
        self.parse_query = Some(enabled);
        self
    }

    /// Add one metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Route configuration after merging with owner defaults.
#[derive(Debug, Clone, Default)]
pub struct HandlerConfig {
    pub parse_query: bool,
    pub metadata: Arc<Metadata>,
}

impl HandlerConfig {
    /// Merge `config` over the owner's `parse_query` default.
    #[must_use]
    pub fn resolve(config: RouteConfig, owner_parse_query: bool) -> Self {
        Self {
            parse_query: config.parse_query.unwrap_or(owner_parse_query),
            metadata: Arc::new(config.metadata),
        }
    }
}

/// A registered handler together with its resolved configuration.
#[derive(Clone)]
pub struct HandlerEntry {
    handler: BoxedHandler,
    config: HandlerConfig,
}

impl HandlerEntry {
    #[must_use]
    pub fn new(handler: BoxedHandler, config: HandlerConfig) -> Self {
        Self { handler, config }
    }

    #[must_use]
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Run the handler. The raw query is parsed first when enabled, so the
    /// query map is only filled for the winning route.
    pub fn invoke<'a>(&'a self, req: &'a mut Request) -> BoxFuture<'a, HandlerResult> {
        if self.config.parse_query {
            if let Some(raw) = req.raw_query.as_deref() {
                let query = parse_query(raw);
                req.query = query;
            }
        }
        (self.handler)(req)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// One path and its method table.
#[derive(Debug)]
pub struct Route {
    path: RoutePath,
    handlers: [Option<HandlerEntry>; RouteMethod::COUNT],
}

impl Route {
    #[must_use]
    pub fn new(path: RoutePath) -> Self {
        Self {
            path,
            handlers: std::array::from_fn(|_| None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    /// Insert or overwrite the entry for `method`.
    ///
    /// `Any` and explicit slots never overwrite each other. Returns the entry
    /// that was replaced, if any.
    pub fn add_handler(&mut self, method: RouteMethod, entry: HandlerEntry) -> Option<HandlerEntry> {
        self.handlers[method.index()].replace(entry)
    }

    /// Exact slot first, then `Any`.
    #[must_use]
    pub fn resolve(&self, method: &Method) -> Option<&HandlerEntry> {
        RouteMethod::from_http(method)
            .and_then(|slot| self.handlers[slot.index()].as_ref())
            .or_else(|| self.handlers[RouteMethod::Any.index()].as_ref())
    }

    /// Entry registered under exactly `method`, without fallback.
    #[must_use]
    pub fn entry(&self, method: RouteMethod) -> Option<&HandlerEntry> {
        self.handlers[method.index()].as_ref()
    }

    /// Slots that currently hold a handler.
    pub fn methods(&self) -> impl Iterator<Item = RouteMethod> + '_ {
        RouteMethod::ALL
            .into_iter()
            .filter(|m| self.handlers[m.index()].is_some())
    }
}
