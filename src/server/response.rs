use anyhow::Context;
use serde::Serialize;
use std::borrow::Cow;

use super::headers::Headers;

/// Response produced by handlers, hooks and the error path.
///
/// The status defaults to 200 and the body to empty. Nothing touches the wire
/// until [`Response::into_http`] materialises it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::empty(200)
    }
}

impl Response {
    /// 200 with an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty body with the given status.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Plain-text body.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut res = Self::empty(status);
        res.headers.set("content-type", "text/plain; charset=utf-8");
        res.body = body.into().into_bytes();
        res
    }

    /// JSON body serialised with `serde_json`.
    ///
    /// # Errors
    ///
    /// Fails if `value` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> anyhow::Result<Self> {
        let body = serde_json::to_vec(value).context("failed to serialize JSON response body")?;
        let mut res = Self::empty(status);
        res.headers.set("content-type", "application/json");
        res.body = body;
        Ok(res)
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.headers.set(name, value);
        self
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Build the wire response.
    ///
    /// # Errors
    ///
    /// Fails on a status outside 100..=999 or a header the `http` crate
    /// rejects.
    pub fn into_http(self) -> anyhow::Result<http::Response<Vec<u8>>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in self.headers.iter() {
            builder = builder.header(name, value);
        }
        builder
            .body(self.body)
            .with_context(|| format!("invalid response (status {})", self.status))
    }
}
