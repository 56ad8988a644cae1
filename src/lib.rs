//! # switchyard
//!
//! **switchyard** is a hook-driven HTTP request router. It takes an already
//! parsed request, finds the handler for it, runs the handler inside a
//! per-owner hook pipeline and returns a response. Sockets, TLS and the wire
//! protocol belong to the host.
//!
//! ## Architecture
//!
//! - **[`router`]** - path kinds (literal, pattern, regex), the route index
//!   and the pattern matcher
//! - **[`dispatcher`]** - route owners, controllers, hook chains and the
//!   dispatch state machine
//! - **[`server`]** - request/response types, URL and query parsing, and the
//!   root [`App`](server::App)
//! - **[`error`]** - [`HttpError`](error::HttpError) classification and
//!   registration errors
//! - **[`plugins`]** - plugin contract plus request metrics and trace logging
//! - **[`runtime_config`]** / **[`otel`]** - environment configuration and
//!   logging setup
//!
//! ### Request flow
//!
//! ```text
//! preParse → parse → preRoute → literal → controllers → pattern → regex → * → not found
//!                                    └── preHandle → handler → postHandle ──┘
//!                                                                   preSend → wire
//! ```
//!
//! Every owner (the app and each controller) has its own `preRoute`,
//! `preHandle` and `postHandle` chains; `preParse` and `preSend` exist only on
//! the app. A hook that returns a response short-circuits everything after it.
//!
//! ## Quick Start
//!
//! ```rust
//! use switchyard::dispatcher::{Controller, RouteRegistrar};
//! use switchyard::error::HttpError;
//! use switchyard::server::{App, Response};
//!
//! let mut app = App::new();
//! app.get("/users/:id", |req| {
//!     Box::pin(async move {
//!         let id = req.param("id").unwrap_or_default();
//!         Ok(Response::text(200, format!("user {id}")))
//!     })
//! })
//! .unwrap();
//!
//! let mut admin = Controller::new("/admin");
//! admin
//!     .get("/stats", |_req| {
//!         Box::pin(async move { Err(HttpError::forbidden("Admins only").into()) })
//!     })
//!     .unwrap();
//! app.controller(admin);
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let res = rt.block_on(app.handle(http::Request::get("/users/7").body(Vec::new()).unwrap()));
//! assert_eq!(res.body(), b"user 7");
//! let res = rt.block_on(app.handle(http::Request::get("/admin/stats").body(Vec::new()).unwrap()));
//! assert_eq!(res.status(), 403);
//! ```
//!
//! ## Lifecycle
//!
//! Registration takes `&mut self` and dispatch `&self`. Build the whole tree
//! first, then share it (for example in an `Arc`) across tasks; the borrow
//! rules keep it frozen while it serves.
//!
//! ## Logging
//!
//! All components log through `tracing`. Install a subscriber with
//! [`otel::init_logging_with_config`] or bring your own.

pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod otel;
pub mod plugins;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{Controller, RouteOwner, RouteRegistrar};
pub use error::HttpError;
pub use server::{App, Request, Response};
