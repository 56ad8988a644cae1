//! # Dispatcher Module
//!
//! The dispatcher turns a [`Request`](crate::server::Request) into a
//! [`Response`](crate::server::Response) by walking an owner's route tables,
//! controllers and hook chains.
//!
//! ## Overview
//!
//! - [`RouteOwner`] holds the route index, attached [`Controller`]s, the
//!   `preRoute` / `preHandle` / `postHandle` chains, and optional not-found
//!   and error handlers.
//! - [`Controller`] is a route owner mounted under a path prefix. The parent
//!   strips the prefix and hands the remainder to the controller.
//! - [`RouteRegistrar`] is the registration surface (`get`, `post`, ...,
//!   hooks, plugins) implemented by owners, controllers and the root
//!   [`App`](crate::server::App).
//!
//! ## Handlers and hooks
//!
//! Handlers and hooks are async closures returning a boxed future:
//!
//! ```rust
//! use switchyard::dispatcher::{RouteOwner, RouteRegistrar};
//! use switchyard::error::HttpError;
//! use switchyard::server::Response;
//!
//! let mut owner = RouteOwner::new();
//! owner.pre_handle(|req, _meta| {
//!     Box::pin(async move {
//!         if req.header("authorization").is_none() {
//!             return Err(HttpError::unauthorized("Missing credentials").into());
//!         }
//!         Ok(None)
//!     })
//! });
//! owner
//!     .post("/login", |_req| Box::pin(async move { Ok(Response::text(200, "ok")) }))
//!     .unwrap();
//! ```
//!
//! ## Error Handling
//!
//! Handlers and hooks return `anyhow::Result`. An
//! [`HttpError`](crate::error::HttpError) picks the response status and body;
//! any other error is logged and answered with a generic 500. A custom error
//! handler replaces both behaviours for its owner.

mod controller;
mod hooks;
mod owner;

pub use controller::Controller;
pub use hooks::{
    BoxedHandler, ErrorHandler, HandlerResult, HookChains, HookName, HookResult, PostHandleHook,
    PreHandleHook, PreRouteHook,
};
pub use owner::{OwnerConfig, RouteOwner, RouteRegistrar, INTERNAL_ERROR_MESSAGE};

pub(crate) use hooks::log_short_circuit;
