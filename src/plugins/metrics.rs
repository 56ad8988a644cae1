use futures::future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{mark_start, Plugin, RequestStart};
use crate::dispatcher::{RouteOwner, RouteRegistrar};

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    completed: AtomicU64,
    status_2xx: AtomicU64,
    status_3xx: AtomicU64,
    status_4xx: AtomicU64,
    status_5xx: AtomicU64,
    total_latency_ns: AtomicU64,
}

/// Request counters kept with relaxed atomics.
///
/// - `requests` counts every request that reaches the owner (`preRoute`)
/// - the status classes and latency count responses that pass through
///   `postHandle`, i.e. requests that reached a handler or controller
///
/// Clones share the same counters, so keep one clone to read them.
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    counters: Arc<Counters>,
}

/// Point-in-time copy of [`RequestMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub completed: u64,
    pub status_2xx: u64,
    pub status_3xx: u64,
    pub status_4xx: u64,
    pub status_5xx: u64,
    pub total_latency: Duration,
}

impl MetricsSnapshot {
    /// Mean latency of completed requests; zero before the first one.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        if self.completed == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total_latency.as_nanos() / u128::from(self.completed);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        }
    }
}

impl RequestMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.counters;
        MetricsSnapshot {
            requests: c.requests.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            status_2xx: c.status_2xx.load(Ordering::Relaxed),
            status_3xx: c.status_3xx.load(Ordering::Relaxed),
            status_4xx: c.status_4xx.load(Ordering::Relaxed),
            status_5xx: c.status_5xx.load(Ordering::Relaxed),
            total_latency: Duration::from_nanos(c.total_latency_ns.load(Ordering::Relaxed)),
        }
    }
}

impl Counters {
    fn record(&self, status: u16, latency: Option<Duration>) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        let class = match status {
            200..=299 => Some(&self.status_2xx),
            300..=399 => Some(&self.status_3xx),
            400..=499 => Some(&self.status_4xx),
            500..=599 => Some(&self.status_5xx),
            _ => None,
        };
        if let Some(counter) = class {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(latency) = latency {
            let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
            self.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
        }
    }
}

impl Plugin for RequestMetrics {
    fn install(&self, owner: &mut RouteOwner) -> anyhow::Result<()> {
        let counters = Arc::clone(&self.counters);
        owner.pre_route(move |req| {
            counters.requests.fetch_add(1, Ordering::Relaxed);
            mark_start(&mut req.extensions);
            Box::pin(future::ready(Ok(None)))
        });

        let counters = Arc::clone(&self.counters);
        owner.post_handle(move |req, res, _metadata| {
            let latency = req
                .extensions
                .get::<RequestStart>()
                .map(|start| start.0.elapsed());
            counters.record(res.status(), latency);
            Box::pin(future::ready(Ok(None)))
        });
        Ok(())
    }
}
