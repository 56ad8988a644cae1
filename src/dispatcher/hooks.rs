//! Hook and handler callable types, and the per-owner hook chains.
//!
//! Every callable borrows the request mutably and returns a boxed `Send`
//! future, so async closures of the form
//! `|req| Box::pin(async move { ... })` can be registered directly.
//!
//! A hook returning `Ok(Some(response))` short-circuits: the remaining hooks
//! in its chain and every later dispatch stage are skipped. `Ok(None)` passes
//! control on. `Err(_)` aborts dispatch and goes to the owner's error path.

use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::HttpError;
use crate::router::Metadata;
use crate::server::{Request, Response};

/// Result of a route handler or not-found handler.
pub type HandlerResult = anyhow::Result<Response>;

/// Result of a hook: `Some` short-circuits with that response.
pub type HookResult = anyhow::Result<Option<Response>>;

/// Route handler, also used for the not-found handler.
pub type BoxedHandler =
    Arc<dyn for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HandlerResult> + Send + Sync>;

/// Runs before any route lookup. May rewrite `request.pathname`.
pub type PreRouteHook =
    Arc<dyn for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HookResult> + Send + Sync>;

/// Runs after a route was selected, before its handler.
pub type PreHandleHook = Arc<
    dyn for<'a> Fn(&'a mut Request, &'a Metadata) -> BoxFuture<'a, HookResult> + Send + Sync,
>;

/// Runs after the handler produced a response. May mutate the response in
/// place or replace it.
pub type PostHandleHook = Arc<
    dyn for<'a> Fn(&'a mut Request, &'a mut Response, &'a Metadata) -> BoxFuture<'a, HookResult>
        + Send
        + Sync,
>;

/// Custom error handler. Receives the raised error, the request, and the
/// classified [`HttpError`] when the error is one.
pub type ErrorHandler = Arc<
    dyn for<'a> Fn(&'a anyhow::Error, &'a mut Request, Option<&'a HttpError>) -> BoxFuture<'a, Response>
        + Send
        + Sync,
>;

/// Names of the hook chains, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookName {
    PreParse,
    PreRoute,
    PreHandle,
    PostHandle,
    PreSend,
}

impl HookName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HookName::PreParse => "preParse",
            HookName::PreRoute => "preRoute",
            HookName::PreHandle => "preHandle",
            HookName::PostHandle => "postHandle",
            HookName::PreSend => "preSend",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered hook chains of one owner. Hooks run in registration order.
#[derive(Clone, Default)]
pub struct HookChains {
    pub(crate) pre_route: Vec<PreRouteHook>,
    pub(crate) pre_handle: Vec<PreHandleHook>,
    pub(crate) post_handle: Vec<PostHandleHook>,
}

impl HookChains {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hooks registered in a chain. Root-only chains report 0.
    #[must_use]
    pub fn len(&self, name: HookName) -> usize {
        match name {
            HookName::PreRoute => self.pre_route.len(),
            HookName::PreHandle => self.pre_handle.len(),
            HookName::PostHandle => self.post_handle.len(),
            HookName::PreParse | HookName::PreSend => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pre_route.is_empty() && self.pre_handle.is_empty() && self.post_handle.is_empty()
    }

    pub(crate) async fn run_pre_route(&self, req: &mut Request) -> HookResult {
        for (position, hook) in self.pre_route.iter().enumerate() {
            if let Some(res) = hook(&mut *req).await? {
                log_short_circuit(HookName::PreRoute, position, &res);
                return Ok(Some(res));
            }
        }
        Ok(None)
    }

    pub(crate) async fn run_pre_handle(&self, req: &mut Request, metadata: &Metadata) -> HookResult {
        for (position, hook) in self.pre_handle.iter().enumerate() {
            if let Some(res) = hook(&mut *req, metadata).await? {
                log_short_circuit(HookName::PreHandle, position, &res);
                return Ok(Some(res));
            }
        }
        Ok(None)
    }

    pub(crate) async fn run_post_handle(
        &self,
        req: &mut Request,
        res: &mut Response,
        metadata: &Metadata,
    ) -> HookResult {
        for (position, hook) in self.post_handle.iter().enumerate() {
            if let Some(replacement) = hook(&mut *req, &mut *res, metadata).await? {
                log_short_circuit(HookName::PostHandle, position, &replacement);
                return Ok(Some(replacement));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for HookChains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChains")
            .field("pre_route", &self.pre_route.len())
            .field("pre_handle", &self.pre_handle.len())
            .field("post_handle", &self.post_handle.len())
            .finish()
    }
}

pub(crate) fn log_short_circuit(hook: HookName, position: usize, res: &Response) {
    debug!(
        hook = %hook,
        position = position,
        status = res.status(),
        "Hook short-circuited dispatch"
    );
}
