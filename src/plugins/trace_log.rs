use futures::future;
use tracing::info;

use super::{mark_start, Plugin, RequestStart};
use crate::dispatcher::{RouteOwner, RouteRegistrar};

/// Logs one `info` event per handled request.
///
/// The event carries the request id, method, path, status, latency and, when
/// the route metadata has a string `name` entry, the route name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceLog;

impl TraceLog {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for TraceLog {
    fn install(&self, owner: &mut RouteOwner) -> anyhow::Result<()> {
        owner.pre_route(|req| {
            mark_start(&mut req.extensions);
            Box::pin(future::ready(Ok(None)))
        });
        owner.post_handle(|req, res, metadata| {
            let latency_us = req
                .extensions
                .get::<RequestStart>()
                .map_or(0, |start| {
                    u64::try_from(start.0.elapsed().as_micros()).unwrap_or(u64::MAX)
                });
            let route = metadata
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("-");
            info!(
                request_id = %req.id,
                method = %req.method,
                path = %req.pathname,
                route = route,
                status = res.status(),
                latency_us = latency_us,
                "Request handled"
            );
            Box::pin(future::ready(Ok(None)))
        });
        Ok(())
    }
}
