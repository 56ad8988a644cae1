//! # Plugins Module
//!
//! A plugin bundles routes and hooks and installs them on a route owner in
//! one call:
//!
//! ```rust
//! use switchyard::dispatcher::{RouteOwner, RouteRegistrar};
//! use switchyard::plugins::{RequestMetrics, TraceLog};
//! use switchyard::server::Response;
//!
//! let metrics = RequestMetrics::new();
//! let mut owner = RouteOwner::new();
//! owner
//!     .plugin(metrics.clone())
//!     .unwrap()
//!     .plugin(TraceLog::new())
//!     .unwrap()
//!     .plugin(|owner: &mut RouteOwner| -> anyhow::Result<()> {
//!         owner.get("/ping", |_req| Box::pin(async move { Ok(Response::text(200, "pong")) }))?;
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(metrics.snapshot().requests, 0);
//! ```
//!
//! Plugins install on the owner they are given. Installed on both a parent
//! and one of its controllers, a plugin sees delegated requests twice.

mod metrics;
mod trace_log;

use std::time::Instant;

use crate::dispatcher::RouteOwner;

pub use metrics::{MetricsSnapshot, RequestMetrics};
pub use trace_log::TraceLog;

/// Something that can register routes and hooks on a route owner.
///
/// Closures taking `&mut RouteOwner` are plugins too.
pub trait Plugin {
    /// Register routes and hooks.
    ///
    /// # Errors
    ///
    /// Any error aborts installation; the owner may be partially modified.
    fn install(&self, owner: &mut RouteOwner) -> anyhow::Result<()>;
}

impl<F> Plugin for F
where
    F: Fn(&mut RouteOwner) -> anyhow::Result<()>,
{
    fn install(&self, owner: &mut RouteOwner) -> anyhow::Result<()> {
        self(owner)
    }
}

/// When the first `preRoute` hook of a built-in plugin saw the request.
///
/// Stored in [`Request::extensions`](crate::server::Request::extensions);
/// later plugins reuse the existing value.
#[derive(Debug, Clone, Copy)]
pub struct RequestStart(pub Instant);

pub(crate) fn mark_start(extensions: &mut http::Extensions) {
    if extensions.get::<RequestStart>().is_none() {
        extensions.insert(RequestStart(Instant::now()));
    }
}
