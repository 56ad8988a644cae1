//! Command-line interface of the `switchyard-probe` binary.
//!
//! The probe builds a small demo application and pushes one synthetic request
//! through it, printing what came back. It is a way to watch dispatch, hooks
//! and logging without a network listener.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use regex::Regex;

use crate::dispatcher::{Controller, RouteRegistrar};
use crate::error::HttpError;
use crate::plugins::{RequestMetrics, TraceLog};
use crate::router::RouteConfig;
use crate::server::{App, Response};

/// Command-line interface for the probe
#[derive(Debug, Parser)]
#[command(name = "switchyard-probe")]
#[command(about = "Dispatch a synthetic request through a demo switchyard app", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send one request to the demo application
    Request {
        /// Request target, e.g. `/users/42?verbose=1`
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Header in `name: value` form (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,

        /// Echo the request id as `x-request-id`
        #[arg(long, env = "SWITCHYARD_ECHO_REQUEST_ID", default_value_t = false)]
        echo_request_id: bool,
    },
    /// List the demo application's routes
    Routes,
}

/// The demo application used by the probe.
///
/// # Errors
///
/// Fails only if a demo route is invalid.
pub fn demo_app(metrics: &RequestMetrics) -> Result<App> {
    let mut app = App::from_env();
    app.plugin(metrics.clone())?.plugin(TraceLog::new())?;

    app.get_with(
        "/health",
        RouteConfig::new().metadata("name", "health"),
        |_req| Box::pin(async move { Ok(Response::text(200, "ok")) }),
    )?
    .get_with(
        "/users/:id",
        RouteConfig::new().metadata("name", "get_user"),
        |req| {
            Box::pin(async move {
                let id = req.param("id").unwrap_or_default();
                let verbose = req.query_param("verbose").is_some();
                Response::json(200, &serde_json::json!({ "id": id, "verbose": verbose }))
            })
        },
    )?
    .any("/echo", |req| {
        Box::pin(async move {
            let mut res = Response::new();
            if let Some(content_type) = req.header("content-type") {
                res.headers_mut().set("content-type", content_type);
            }
            res.set_body(std::mem::take(&mut req.body));
            Ok(res)
        })
    })?
    .get(Regex::new("^/files/")?, |req| {
        let path = req.pathname.clone();
        Box::pin(async move { Ok(Response::text(200, format!("file {path}"))) })
    })?
    .get("/teapot", |_req| {
        Box::pin(async move { Err(HttpError::im_a_teapot("short and stout").into()) })
    })?;

    let mut admin = Controller::new("/admin");
    let snapshot_source = metrics.clone();
    admin.get("/metrics", move |_req| {
        let snapshot = snapshot_source.snapshot();
        Box::pin(async move {
            Response::json(
                200,
                &serde_json::json!({
                    "requests": snapshot.requests,
                    "completed": snapshot.completed,
                    "2xx": snapshot.status_2xx,
                    "4xx": snapshot.status_4xx,
                    "5xx": snapshot.status_5xx,
                }),
            )
        })
    })?;
    app.controller(admin);

    app.set_not_found(|req| {
        let path = req.pathname.clone();
        Box::pin(async move { Ok(Response::text(404, format!("nothing at {path}"))) })
    });
    Ok(app)
}

/// Parse `name: value`.
fn parse_header(raw: &str) -> Result<(&str, &str)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header '{raw}' is not in 'name: value' form"))?;
    Ok((name.trim(), value.trim()))
}

/// Build the wire request for the `request` subcommand.
///
/// # Errors
///
/// Fails on an invalid method, header or URL.
pub fn build_request(
    url: &str,
    method: &str,
    headers: &[String],
    body: Option<&str>,
) -> Result<http::Request<Vec<u8>>> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method '{method}'"))?;
    let mut builder = http::Request::builder().method(method).uri(url);
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        builder = builder.header(name, value);
    }
    builder
        .body(body.unwrap_or_default().as_bytes().to_vec())
        .context("invalid request")
}

/// Render a response the way the probe prints it.
#[must_use]
pub fn render_response(res: &http::Response<Vec<u8>>) -> String {
    let mut lines = vec![res.status().to_string()];
    for (name, value) in res.headers() {
        lines.push(format!("{}: {}", name, value.to_str().unwrap_or("<binary>")));
    }
    let mut out = lines.join("\n");
    out.push_str("\n\n");
    out.push_str(&String::from_utf8_lossy(res.body()));
    out
}

/// Routes of an application, one per line, as `METHOD path (kind)`.
#[must_use]
pub fn render_routes(app: &App) -> String {
    let mut lines: Vec<String> = app
        .owner()
        .index()
        .routes()
        .flat_map(|route| {
            route
                .methods()
                .map(move |m| format!("{m:<7} {} ({})", route.path(), route.path().kind()))
        })
        .collect();
    for controller in app.owner().controllers() {
        for route in controller.owner().index().routes() {
            for m in route.methods() {
                lines.push(format!(
                    "{m:<7} {}{} (controller)",
                    controller.prefix(),
                    route.path()
                ));
            }
        }
    }
    lines.sort();
    lines.join("\n")
}

/// Execute a parsed command and return what should be printed.
///
/// # Errors
///
/// Fails if the demo app cannot be built or the request is invalid.
pub async fn run_cli(cli: Cli) -> Result<String> {
    let metrics = RequestMetrics::new();
    match cli.command {
        Commands::Request {
            url,
            method,
            headers,
            body,
            echo_request_id,
        } => {
            let app = demo_app(&metrics)?.echo_request_id(echo_request_id);
            let req = build_request(&url, &method, &headers, body.as_deref())?;
            let res = app.handle(req).await;
            Ok(render_response(&res))
        }
        Commands::Routes => Ok(render_routes(&demo_app(&metrics)?)),
    }
}
