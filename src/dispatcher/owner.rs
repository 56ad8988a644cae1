//! Route owner: route tables, hook chains, controllers and the dispatch state
//! machine.
//!
//! # Dispatch order
//!
//! For one request and a lookup path:
//!
//! 1. `preRoute` hooks
//! 2. literal route (with a handler for the method or `ANY`)
//! 3. first controller whose prefix covers the path; the controller's
//!    response then goes through this owner's `postHandle` hooks
//! 4. first matching pattern route (parameters attached to the request)
//! 5. first matching regex route
//! 6. wildcard `*`
//! 7. not-found handler, or an empty 404
//!
//! Any error raised on the way lands in [`RouteOwner::handle_error`].

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::controller::Controller;
use super::hooks::{
    BoxedHandler, ErrorHandler, HandlerResult, HookChains, HookName, HookResult,
};
use crate::error::{HttpError, RouteError};
use crate::plugins::Plugin;
use crate::router::{
    HandlerConfig, HandlerEntry, Insertion, IntoRoutePath, Metadata, RouteConfig, RouteHit,
    RouteIndex, RouteMethod, RoutePath,
};
use crate::runtime_config::RuntimeConfig;
use crate::server::{Request, Response};

/// Body of the response for errors that are not an [`HttpError`].
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";

/// Metadata handed to `postHandle` hooks that run on a controller's response.
static NO_METADATA: Lazy<Metadata> = Lazy::new(Metadata::new);

/// Construction options of a route owner.
#[derive(Clone)]
pub struct OwnerConfig {
    /// Default for routes that do not set `parse_query` themselves.
    pub parse_query: bool,
    pub not_found: Option<BoxedHandler>,
    pub error_handler: Option<ErrorHandler>,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            parse_query: true,
            not_found: None,
            error_handler: None,
        }
    }
}

impl OwnerConfig {
    /// Defaults seeded from [`RuntimeConfig::from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            parse_query: RuntimeConfig::from_env().parse_query,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn parse_query(mut self, enabled: bool) -> Self {
        self.parse_query = enabled;
        self
    }

    #[must_use]
    pub fn not_found<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: for<'a> Fn(&'a anyhow::Error, &'a mut Request, Option<&'a HttpError>) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }
}

impl std::fmt::Debug for OwnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerConfig")
            .field("parse_query", &self.parse_query)
            .field("not_found", &self.not_found.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

/// Holds routes, hooks and controllers, and dispatches requests over them.
///
/// Registration needs `&mut self`; dispatch only `&self`, so a fully built
/// owner can be shared behind an `Arc` and served concurrently.
#[derive(Default)]
pub struct RouteOwner {
    config: OwnerConfig,
    index: RouteIndex,
    controllers: Vec<Controller>,
    hooks: HookChains,
}

impl RouteOwner {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(OwnerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: OwnerConfig) -> Self {
        Self {
            config,
            index: RouteIndex::new(),
            controllers: Vec::new(),
            hooks: HookChains::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &OwnerConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut OwnerConfig {
        &mut self.config
    }

    #[must_use]
    pub fn index(&self) -> &RouteIndex {
        &self.index
    }

    #[must_use]
    pub fn hooks(&self) -> &HookChains {
        &self.hooks
    }

    #[must_use]
    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    /// Store `handler` for `method` on `path`, merging `config` over the
    /// owner defaults. Registering the same path and method again replaces
    /// the earlier handler.
    pub fn register(
        &mut self,
        method: RouteMethod,
        path: RoutePath,
        config: RouteConfig,
        handler: BoxedHandler,
    ) -> Insertion {
        let kind = path.kind();
        let key = path.key().to_string();
        let entry = HandlerEntry::new(
            handler,
            HandlerConfig::resolve(config, self.config.parse_query),
        );
        let outcome = self.index.insert(path, method, entry);
        match outcome {
            Insertion::Replaced => debug!(
                method = %method,
                route = %key,
                kind = kind,
                "Replaced existing route handler"
            ),
            _ => debug!(
                method = %method,
                route = %key,
                kind = kind,
                outcome = ?outcome,
                "Registered route"
            ),
        }
        outcome
    }

    /// Attach a controller. A controller without its own not-found or error
    /// handler takes this owner's, as set at the time of attaching.
    pub fn attach_controller(&mut self, mut controller: Controller) -> &mut Self {
        controller.inherit(&self.config);
        debug!(prefix = %controller.prefix(), "Attached controller");
        self.controllers.push(controller);
        self
    }

    /// Dispatch a request using its own pathname.
    pub fn dispatch<'a>(&'a self, req: &'a mut Request) -> BoxFuture<'a, Response> {
        self.dispatch_at(req, None)
    }

    /// Dispatch with an explicit lookup path. Controllers use this to pass
    /// the path with their prefix removed. Never fails: errors are turned
    /// into responses by the error path.
    pub fn dispatch_at<'a>(
        &'a self,
        req: &'a mut Request,
        path: Option<String>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let outcome = self.route_request(&mut *req, path).await;
            match outcome {
                Ok(res) => res,
                Err(err) => self.handle_error(err, req).await,
            }
        })
    }

    async fn route_request(&self, req: &mut Request, path: Option<String>) -> HandlerResult {
        if let Some(res) = self.hooks.run_pre_route(&mut *req).await? {
            return Ok(res);
        }

        // Read after preRoute so hooks can rewrite the root lookup path.
        let path = path.unwrap_or_else(|| req.pathname.clone());
        let method = req.method.clone();

        if let Some(hit) = self.index.match_literal(&path, &method) {
            return self.run_route(req, hit, &path).await;
        }

        if let Some(controller) = self.controllers.iter().find(|c| c.matches(&path)) {
            debug!(prefix = %controller.prefix(), path = %path, "Delegating to controller");
            let mut res = controller.dispatch(&mut *req, &path).await;
            if let Some(replacement) = self
                .hooks
                .run_post_handle(&mut *req, &mut res, &NO_METADATA)
                .await?
            {
                return Ok(replacement);
            }
            return Ok(res);
        }

        let hit = self
            .index
            .match_pattern(&path, &method)
            .or_else(|| self.index.match_regex(&path, &method))
            .or_else(|| self.index.match_wildcard(&method));
        if let Some(hit) = hit {
            return self.run_route(req, hit, &path).await;
        }

        debug!(method = %method, path = %path, "No route matched");
        match &self.config.not_found {
            Some(handler) => handler(req).await,
            None => Ok(Response::empty(404)),
        }
    }

    async fn run_route(&self, req: &mut Request, hit: RouteHit<'_>, path: &str) -> HandlerResult {
        debug!(
            method = %req.method,
            path = %path,
            route = %hit.route.path(),
            stage = %hit.stage,
            "Route matched"
        );
        if let Some(params) = hit.params {
            req.params = params;
        }
        let metadata: &Metadata = &hit.entry.config().metadata;

        if let Some(res) = self.hooks.run_pre_handle(&mut *req, metadata).await? {
            return Ok(res);
        }
        let mut res = hit.entry.invoke(&mut *req).await?;
        if let Some(replacement) = self
            .hooks
            .run_post_handle(&mut *req, &mut res, metadata)
            .await?
        {
            return Ok(replacement);
        }
        Ok(res)
    }

    /// Turn a raised error into a response.
    ///
    /// A custom error handler gets the error, the request and the classified
    /// [`HttpError`] if there is one. Without a handler, an [`HttpError`]
    /// becomes its own response and anything else a logged 500.
    pub async fn handle_error(&self, err: anyhow::Error, req: &mut Request) -> Response {
        let classified = err.downcast_ref::<HttpError>();
        if let Some(handler) = &self.config.error_handler {
            return handler(&err, req, classified).await;
        }
        match classified {
            Some(http_err) => {
                warn!(
                    request_id = %req.id,
                    path = %req.pathname,
                    status = http_err.status(),
                    message = %http_err.message(),
                    "Request failed"
                );
                http_err.to_response()
            }
            None => {
                error!(
                    request_id = %req.id,
                    path = %req.pathname,
                    error = ?err,
                    "Unhandled error while dispatching"
                );
                Response::text(500, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl std::fmt::Debug for RouteOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteOwner")
            .field("config", &self.config)
            .field("routes", &self.index.len())
            .field("controllers", &self.controllers.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

macro_rules! verb_methods {
    ($($(#[$doc:meta])* $method:ident, $method_with:ident => $slot:expr;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// Fails if `path` is empty or an invalid template.
            fn $method<P, H>(&mut self, path: P, handler: H) -> Result<&mut Self, RouteError>
            where
                P: IntoRoutePath,
                H: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
            {
                self.route($slot, path, RouteConfig::default(), handler)
            }

            $(#[$doc])*
            /// With per-route configuration.
            ///
            /// # Errors
            ///
            /// Fails if `path` is empty or an invalid template.
            fn $method_with<P, H>(
                &mut self,
                path: P,
                config: RouteConfig,
                handler: H,
            ) -> Result<&mut Self, RouteError>
            where
                P: IntoRoutePath,
                H: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
            {
                self.route($slot, path, config, handler)
            }
        )*
    };
}

/// Registration surface shared by the application, controllers and bare
/// owners.
///
/// ```rust
/// use switchyard::dispatcher::{RouteOwner, RouteRegistrar};
/// use switchyard::server::Response;
///
/// let mut owner = RouteOwner::new();
/// owner
///     .get("/users/:id", |req| {
///         Box::pin(async move {
///             let id = req.param("id").unwrap_or_default().to_string();
///             Ok(Response::text(200, id))
///         })
///     })
///     .unwrap();
/// assert_eq!(owner.index().len(), 1);
/// ```
pub trait RouteRegistrar {
    /// The owner that receives registrations.
    fn route_owner_mut(&mut self) -> &mut RouteOwner;

    /// Register `handler` for `method` on `path`.
    ///
    /// # Errors
    ///
    /// Fails if `path` is empty or an invalid template.
    fn route<P, H>(
        &mut self,
        method: RouteMethod,
        path: P,
        config: RouteConfig,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        P: IntoRoutePath,
        H: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        let path = path.into_route_path()?;
        self.route_owner_mut()
            .register(method, path, config, Arc::new(handler));
        Ok(self)
    }

    verb_methods! {
        /// Register a GET handler.
        get, get_with => RouteMethod::Get;
        /// Register a POST handler.
        post, post_with => RouteMethod::Post;
        /// Register a PUT handler.
        put, put_with => RouteMethod::Put;
        /// Register a PATCH handler.
        patch, patch_with => RouteMethod::Patch;
        /// Register a DELETE handler.
        delete, delete_with => RouteMethod::Delete;
        /// Register an OPTIONS handler.
        options, options_with => RouteMethod::Options;
        /// Register a handler for any method without an explicit one.
        any, any_with => RouteMethod::Any;
    }

    /// Append a `preRoute` hook.
    fn pre_route<F>(&mut self, hook: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
    {
        let owner = self.route_owner_mut();
        owner.hooks.pre_route.push(Arc::new(hook));
        debug!(hook = %HookName::PreRoute, count = owner.hooks.pre_route.len(), "Added hook");
        self
    }

    /// Append a `preHandle` hook.
    fn pre_handle<F>(&mut self, hook: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a Metadata) -> BoxFuture<'a, HookResult>
            + Send
            + Sync
            + 'static,
    {
        let owner = self.route_owner_mut();
        owner.hooks.pre_handle.push(Arc::new(hook));
        debug!(hook = %HookName::PreHandle, count = owner.hooks.pre_handle.len(), "Added hook");
        self
    }

    /// Append a `postHandle` hook.
    fn post_handle<F>(&mut self, hook: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response, &'a Metadata) -> BoxFuture<'a, HookResult>
            + Send
            + Sync
            + 'static,
    {
        let owner = self.route_owner_mut();
        owner.hooks.post_handle.push(Arc::new(hook));
        debug!(hook = %HookName::PostHandle, count = owner.hooks.post_handle.len(), "Added hook");
        self
    }

    /// Handler used when nothing matches. Without one the owner answers an
    /// empty 404.
    fn set_not_found<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.route_owner_mut().config.not_found = Some(Arc::new(handler));
        self
    }

    /// Custom error handler replacing the default classification.
    fn set_error_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a anyhow::Error, &'a mut Request, Option<&'a HttpError>) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        self.route_owner_mut().config.error_handler = Some(Arc::new(handler));
        self
    }

    /// Install a plugin right away.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Plugin`] if the plugin fails to install.
    fn plugin<P: Plugin>(&mut self, plugin: P) -> Result<&mut Self, RouteError> {
        plugin
            .install(self.route_owner_mut())
            .map_err(RouteError::Plugin)?;
        Ok(self)
    }

    /// Attach a controller.
    fn controller(&mut self, controller: Controller) -> &mut Self {
        self.route_owner_mut().attach_controller(controller);
        self
    }
}

impl RouteRegistrar for RouteOwner {
    fn route_owner_mut(&mut self) -> &mut RouteOwner {
        self
    }
}
