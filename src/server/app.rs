//! Root application: the top-level route owner plus the root-only hooks.
//!
//! ```text
//! http::Request ─ preParse ─ Request::from_http ─ dispatch ─ preSend ─ http::Response
//! ```
//!
//! `preParse` sees the raw wire request before any parsing; `preSend` sees
//! the final request and response just before materialisation. Both follow
//! the usual hook contract (`Some` short-circuits, `Err` goes to the error
//! path of the root owner).

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use super::{Request, Response};
use crate::dispatcher::{
    log_short_circuit, HookName, HookResult, OwnerConfig, RouteOwner, RouteRegistrar,
    INTERNAL_ERROR_MESSAGE,
};
use crate::ids::REQUEST_ID_HEADER;
use crate::runtime_config::RuntimeConfig;

/// Runs on the raw request before it is parsed.
pub type PreParseHook =
    Arc<dyn for<'a> Fn(&'a http::Request<Vec<u8>>) -> BoxFuture<'a, HookResult> + Send + Sync>;

/// Runs on the final response before it is sent.
pub type PreSendHook = Arc<
    dyn for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, HookResult> + Send + Sync,
>;

/// The root of a routing tree.
///
/// Build it with the [`RouteRegistrar`] methods, then share it (for example
/// behind an `Arc`) and call [`App::handle`] for every request.
///
/// ```rust
/// use switchyard::dispatcher::RouteRegistrar;
/// use switchyard::server::{App, Response};
///
/// let mut app = App::new();
/// app.get("/", |_req| Box::pin(async move { Ok(Response::text(200, "Hello")) }))
///     .unwrap();
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let wire = http::Request::get("/").body(Vec::new()).unwrap();
/// let res = rt.block_on(app.handle(wire));
/// assert_eq!(res.status(), 200);
/// assert_eq!(res.body(), b"Hello");
/// ```
pub struct App {
    owner: RouteOwner,
    pre_parse: Vec<PreParseHook>,
    pre_send: Vec<PreSendHook>,
    echo_request_id: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(OwnerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: OwnerConfig) -> Self {
        Self {
            owner: RouteOwner::with_config(config),
            pre_parse: Vec::new(),
            pre_send: Vec::new(),
            echo_request_id: false,
        }
    }

    /// Application configured from `SWITCHYARD_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let runtime = RuntimeConfig::from_env();
        let mut app = Self::with_config(OwnerConfig::default().parse_query(runtime.parse_query));
        app.echo_request_id = runtime.echo_request_id;
        app
    }

    /// Copy the request id into an `x-request-id` response header.
    #[must_use]
    pub fn echo_request_id(mut self, enabled: bool) -> Self {
        self.echo_request_id = enabled;
        self
    }

    #[must_use]
    pub fn owner(&self) -> &RouteOwner {
        &self.owner
    }

    /// Append a `preParse` hook.
    pub fn pre_parse<F>(&mut self, hook: F) -> &mut Self
    where
        F: for<'a> Fn(&'a http::Request<Vec<u8>>) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
    {
        self.pre_parse.push(Arc::new(hook));
        debug!(hook = %HookName::PreParse, count = self.pre_parse.len(), "Added hook");
        self
    }

    /// Append a `preSend` hook.
    pub fn pre_send<F>(&mut self, hook: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, HookResult>
            + Send
            + Sync
            + 'static,
    {
        self.pre_send.push(Arc::new(hook));
        debug!(hook = %HookName::PreSend, count = self.pre_send.len(), "Added hook");
        self
    }

    /// Handle one wire request end to end. Never fails; a response that
    /// cannot be materialised becomes a plain 500.
    pub async fn handle(&self, raw: http::Request<Vec<u8>>) -> http::Response<Vec<u8>> {
        let res = self.respond(raw).await;
        let status = res.status();
        match res.into_http() {
            Ok(wire) => wire,
            Err(err) => {
                error!(status = status, error = ?err, "Failed to materialize response");
                let mut fallback = http::Response::new(INTERNAL_ERROR_MESSAGE.as_bytes().to_vec());
                *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            }
        }
    }

    /// Like [`App::handle`], but returns the response before it is turned
    /// into an `http::Response`.
    pub async fn respond(&self, raw: http::Request<Vec<u8>>) -> Response {
        let started = Instant::now();

        let mut failure = None;
        for (position, hook) in self.pre_parse.iter().enumerate() {
            let outcome = hook(&raw).await;
            match outcome {
                Ok(Some(res)) => {
                    log_short_circuit(HookName::PreParse, position, &res);
                    return res;
                }
                Ok(None) => {}
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        // A failed preParse hook still needs a request for the error path,
        // even when the target itself is unusable.
        let fallback = failure
            .as_ref()
            .map(|_| (raw.method().clone(), raw.uri().to_string()));
        let mut req = match Request::from_http(raw) {
            Ok(req) => req,
            Err(rejection) => {
                warn!(
                    status = rejection.status(),
                    message = %rejection.message(),
                    "Rejected request"
                );
                match fallback.map(|(method, target)| (Request::new(method, "/"), target)) {
                    Some((Ok(mut req), target)) => {
                        req.url = target;
                        req
                    }
                    _ => return rejection.to_response(),
                }
            }
        };

        let mut res = match failure {
            Some(err) => self.owner.handle_error(err, &mut req).await,
            None => self.owner.dispatch(&mut req).await,
        };

        for (position, hook) in self.pre_send.iter().enumerate() {
            let outcome = hook(&mut req, &mut res).await;
            match outcome {
                Ok(Some(replacement)) => {
                    log_short_circuit(HookName::PreSend, position, &replacement);
                    res = replacement;
                    break;
                }
                Ok(None) => {}
                Err(err) => {
                    res = self.owner.handle_error(err, &mut req).await;
                    break;
                }
            }
        }

        if self.echo_request_id {
            res.headers_mut().set(REQUEST_ID_HEADER, req.id.to_string());
        }

        debug!(
            request_id = %req.id,
            method = %req.method,
            path = %req.pathname,
            status = res.status(),
            latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "Request completed"
        );
        res
    }
}

impl RouteRegistrar for App {
    fn route_owner_mut(&mut self) -> &mut RouteOwner {
        &mut self.owner
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("owner", &self.owner)
            .field("pre_parse", &self.pre_parse.len())
            .field("pre_send", &self.pre_send.len())
            .field("echo_request_id", &self.echo_request_id)
            .finish()
    }
}
