//! # Server Module
//!
//! Request and response types, the URL and query parsers, and the root
//! [`App`] that adapts `http` crate messages to the dispatcher.
//!
//! Socket handling is left to the host: anything that can produce an
//! `http::Request<Vec<u8>>` can drive [`App::handle`].

mod app;
mod headers;
mod request;
mod response;

pub use app::{App, PreParseHook, PreSendHook};
pub use headers::{HeaderVec, Headers, MAX_INLINE_HEADERS};
pub use request::{parse_query, parse_url, ParsedUrl, Request};
pub use response::Response;
