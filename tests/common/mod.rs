#![allow(dead_code)]

use futures::future::BoxFuture;
use http::Method;
use std::sync::{Arc, Mutex};
use switchyard::dispatcher::{HandlerResult, HookResult};
use switchyard::router::Metadata;
use switchyard::{Request, Response};

/// Core request for `method` and `url`.
pub fn request(method: Method, url: &str) -> Request {
    Request::new(method, url).unwrap()
}

/// Wire request with an empty body.
pub fn wire(method: Method, uri: &str) -> http::Request<Vec<u8>> {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Vec::new())
        .unwrap()
}

/// Handler answering `status` with a text body.
pub fn reply(
    status: u16,
    body: &'static str,
) -> impl for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static {
    move |_req| Box::pin(async move { Ok(Response::text(status, body)) })
}

/// Body of a core response as text.
pub fn body(res: &Response) -> String {
    res.body_text().into_owned()
}

/// Shared, ordered log of labels recorded by hooks and handlers.
#[derive(Clone, Default)]
pub struct Trail(Arc<Mutex<Vec<String>>>);

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: impl Into<String>) {
        self.0.lock().unwrap().push(label.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    /// `preRoute` hook that records `label` and passes.
    pub fn pre_route(
        &self,
        label: &'static str,
    ) -> impl for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HookResult> + Send + Sync + 'static {
        let trail = self.clone();
        move |_req| {
            trail.push(label);
            Box::pin(async move { Ok(None) })
        }
    }

    /// `preHandle` hook that records `label` and passes.
    pub fn pre_handle(
        &self,
        label: &'static str,
    ) -> impl for<'a> Fn(&'a mut Request, &'a Metadata) -> BoxFuture<'a, HookResult>
           + Send
           + Sync
           + 'static {
        let trail = self.clone();
        move |_req, _meta| {
            trail.push(label);
            Box::pin(async move { Ok(None) })
        }
    }

    /// `postHandle` hook that records `label` and passes.
    pub fn post_handle(
        &self,
        label: &'static str,
    ) -> impl for<'a> Fn(&'a mut Request, &'a mut Response, &'a Metadata) -> BoxFuture<'a, HookResult>
           + Send
           + Sync
           + 'static {
        let trail = self.clone();
        move |_req, _res, _meta| {
            trail.push(label);
            Box::pin(async move { Ok(None) })
        }
    }

    /// Handler that records `label` and answers 200 with `label` as body.
    pub fn handler(
        &self,
        label: &'static str,
    ) -> impl for<'a> Fn(&'a mut Request) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static {
        let trail = self.clone();
        move |_req| {
            trail.push(label);
            Box::pin(async move { Ok(Response::text(200, label)) })
        }
    }
}
