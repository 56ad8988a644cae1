use http::Method;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use switchyard::dispatcher::{OwnerConfig, RouteOwner, RouteRegistrar, INTERNAL_ERROR_MESSAGE};
use switchyard::error::HttpError;
use switchyard::router::RouteConfig;
use switchyard::Response;

mod common;
use common::{body, reply, request, Trail};

async fn dispatch(owner: &RouteOwner, method: Method, url: &str) -> Response {
    let mut req = request(method, url);
    owner.dispatch(&mut req).await
}

// ---------------------------------------------------------------------------
// Route selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_literal_route_with_and_without_trailing_slash() {
    let mut owner = RouteOwner::new();
    owner.get("/health", reply(200, "ok")).unwrap();

    for url in ["/health", "/health/", "/health?probe=1"] {
        let res = dispatch(&owner, Method::GET, url).await;
        assert_eq!(res.status(), 200, "{url}");
        assert_eq!(body(&res), "ok");
    }
}

#[tokio::test]
async fn test_pattern_route_exposes_params() {
    let mut owner = RouteOwner::new();
    owner
        .get("/users/:id/posts/:title", |req| {
            Box::pin(async move {
                let text = format!(
                    "{}:{}",
                    req.param("id").unwrap_or_default(),
                    req.param("title").unwrap_or_default()
                );
                Ok(Response::text(200, text))
            })
        })
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/users/123/posts/deno").await;
    assert_eq!(body(&res), "123:deno");

    let res = dispatch(&owner, Method::GET, "/users/123/posts").await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_literal_beats_pattern() {
    let mut owner = RouteOwner::new();
    owner
        .get("/users/:id", reply(200, "pattern"))
        .unwrap()
        .get("/users/me", reply(200, "literal"))
        .unwrap();

    assert_eq!(body(&dispatch(&owner, Method::GET, "/users/me").await), "literal");
    assert_eq!(body(&dispatch(&owner, Method::GET, "/users/you").await), "pattern");
}

#[tokio::test]
async fn test_pattern_beats_regex_and_regex_beats_wildcard() {
    let mut owner = RouteOwner::new();
    owner
        .any("*", reply(200, "wildcard"))
        .unwrap()
        .get(Regex::new("^/files/").unwrap(), reply(200, "regex"))
        .unwrap()
        .get("/files/:name", reply(200, "pattern"))
        .unwrap();

    assert_eq!(body(&dispatch(&owner, Method::GET, "/files/a").await), "pattern");
    assert_eq!(body(&dispatch(&owner, Method::GET, "/files/a/b").await), "regex");
    assert_eq!(body(&dispatch(&owner, Method::GET, "/elsewhere").await), "wildcard");
    assert_eq!(body(&dispatch(&owner, Method::PATCH, "/files/a").await), "wildcard");
}

#[tokio::test]
async fn test_method_mismatch_falls_through() {
    let mut owner = RouteOwner::new();
    owner
        .post("/items", reply(201, "created"))
        .unwrap()
        .get("/:segment", reply(200, "pattern"))
        .unwrap();

    assert_eq!(dispatch(&owner, Method::POST, "/items").await.status(), 201);
    assert_eq!(body(&dispatch(&owner, Method::GET, "/items").await), "pattern");
    assert_eq!(dispatch(&owner, Method::DELETE, "/items").await.status(), 404);
}

#[tokio::test]
async fn test_any_is_fallback_for_unregistered_methods() {
    let mut owner = RouteOwner::new();
    owner
        .get("/thing", reply(200, "get"))
        .unwrap()
        .any("/thing", reply(200, "any"))
        .unwrap();

    assert_eq!(body(&dispatch(&owner, Method::GET, "/thing").await), "get");
    assert_eq!(body(&dispatch(&owner, Method::POST, "/thing").await), "any");
    assert_eq!(body(&dispatch(&owner, Method::HEAD, "/thing").await), "any");
}

#[tokio::test]
async fn test_first_registered_pattern_wins() {
    let mut owner = RouteOwner::new();
    owner
        .get("/a/:x", reply(200, "first"))
        .unwrap()
        .get("/:y/b", reply(200, "second"))
        .unwrap();

    assert_eq!(body(&dispatch(&owner, Method::GET, "/a/b").await), "first");
}

#[tokio::test]
async fn test_reregistration_replaces_handler() {
    let mut owner = RouteOwner::new();
    owner
        .get("/v", reply(200, "old"))
        .unwrap()
        .get("/v/", reply(200, "new"))
        .unwrap();

    assert_eq!(owner.index().len(), 1);
    assert_eq!(body(&dispatch(&owner, Method::GET, "/v").await), "new");
}

#[tokio::test]
async fn test_invalid_template_is_rejected_at_registration() {
    let mut owner = RouteOwner::new();
    assert!(owner.get("/a/:", reply(200, "")).is_err());
    assert!(owner.get("", reply(200, "")).is_err());
    assert!(owner.index().is_empty());
}

// ---------------------------------------------------------------------------
// Not found
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_default_not_found_is_empty_404() {
    let owner = RouteOwner::new();
    let res = dispatch(&owner, Method::GET, "/missing").await;
    assert_eq!(res.status(), 404);
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn test_custom_not_found_skips_handle_hooks() {
    let trail = Trail::new();
    let mut owner = RouteOwner::new();
    owner
        .pre_route(trail.pre_route("preRoute"))
        .pre_handle(trail.pre_handle("preHandle"))
        .post_handle(trail.post_handle("postHandle"))
        .set_not_found(|req| {
            let path = req.pathname.clone();
            Box::pin(async move { Ok(Response::text(404, format!("no {path}"))) })
        });

    let res = dispatch(&owner, Method::GET, "/nope").await;
    assert_eq!(res.status(), 404);
    assert_eq!(body(&res), "no /nope/");
    assert_eq!(trail.take(), vec!["preRoute"]);
}

#[tokio::test]
async fn test_not_found_handler_errors_use_error_path() {
    let owner = RouteOwner::with_config(OwnerConfig::default().not_found(|_req| {
        Box::pin(async move { Err(HttpError::gone("removed").into()) })
    }));
    let res = dispatch(&owner, Method::GET, "/old").await;
    assert_eq!(res.status(), 410);
    assert_eq!(body(&res), "removed");
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_hooks_run_in_order_around_handler() {
    let trail = Trail::new();
    let mut owner = RouteOwner::new();
    owner
        .pre_route(trail.pre_route("preRoute 1"))
        .pre_route(trail.pre_route("preRoute 2"))
        .pre_handle(trail.pre_handle("preHandle 1"))
        .pre_handle(trail.pre_handle("preHandle 2"))
        .post_handle(trail.post_handle("postHandle 1"))
        .post_handle(trail.post_handle("postHandle 2"))
        .get("/", trail.handler("handler"))
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/").await;
    assert_eq!(res.status(), 200);
    assert_eq!(
        trail.take(),
        vec![
            "preRoute 1",
            "preRoute 2",
            "preHandle 1",
            "preHandle 2",
            "handler",
            "postHandle 1",
            "postHandle 2"
        ]
    );
}

#[tokio::test]
async fn test_pre_route_short_circuit_skips_everything() {
    let trail = Trail::new();
    let mut owner = RouteOwner::new();
    owner
        .pre_route(|_req| Box::pin(async move { Ok(Some(Response::text(403, "blocked"))) }))
        .pre_route(trail.pre_route("second preRoute"))
        .pre_handle(trail.pre_handle("preHandle"))
        .post_handle(trail.post_handle("postHandle"))
        .get("/x", trail.handler("handler"))
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/x").await;
    assert_eq!(res.status(), 403);
    assert_eq!(body(&res), "blocked");
    assert!(trail.take().is_empty());
}

#[tokio::test]
async fn test_pre_handle_short_circuit_skips_handler_and_post_handle() {
    let trail = Trail::new();
    let mut owner = RouteOwner::new();
    owner
        .pre_handle(|req, _meta| {
            Box::pin(async move {
                if req.header("authorization").is_none() {
                    return Ok(Some(Response::text(401, "login first")));
                }
                Ok(None)
            })
        })
        .post_handle(trail.post_handle("postHandle"))
        .get("/private", trail.handler("handler"))
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/private").await;
    assert_eq!(res.status(), 401);
    assert!(trail.take().is_empty());

    let mut req = request(Method::GET, "/private").with_header("Authorization", "Bearer t");
    let res = owner.dispatch(&mut req).await;
    assert_eq!(res.status(), 200);
    assert_eq!(trail.take(), vec!["handler", "postHandle"]);
}

#[tokio::test]
async fn test_post_handle_mutates_or_replaces_response() {
    let mut owner = RouteOwner::new();
    owner
        .post_handle(|_req, res, _meta| {
            res.headers_mut().set("x-powered-by", "switchyard");
            Box::pin(async move { Ok(None) })
        })
        .post_handle(|_req, res, _meta| {
            let replace = res.status() == 204;
            Box::pin(async move { Ok(replace.then(|| Response::text(200, "replaced"))) })
        })
        .get("/a", reply(200, "a"))
        .unwrap()
        .get("/b", |_req| Box::pin(async move { Ok(Response::empty(204)) }))
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/a").await;
    assert_eq!(res.headers().get("x-powered-by"), Some("switchyard"));
    assert_eq!(body(&res), "a");

    let res = dispatch(&owner, Method::GET, "/b").await;
    assert_eq!(res.status(), 200);
    assert_eq!(body(&res), "replaced");
    assert!(res.headers().get("x-powered-by").is_none());
}

#[tokio::test]
async fn test_hooks_see_route_metadata() {
    let mut owner = RouteOwner::new();
    owner
        .pre_handle(|_req, meta| {
            let admin_only = meta.get("admin").and_then(|v| v.as_bool()).unwrap_or(false);
            Box::pin(async move {
                if admin_only {
                    return Err(HttpError::forbidden("Admins only").into());
                }
                Ok(None)
            })
        })
        .get_with("/admin", RouteConfig::new().metadata("admin", true), reply(200, "secret"))
        .unwrap()
        .get("/public", reply(200, "hello"))
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/admin").await;
    assert_eq!(res.status(), 403);
    assert_eq!(body(&res), "Admins only");
    assert_eq!(body(&dispatch(&owner, Method::GET, "/public").await), "hello");
}

#[tokio::test]
async fn test_pre_route_can_rewrite_path() {
    let mut owner = RouteOwner::new();
    owner
        .pre_route(|req| {
            if let Some(rest) = req.pathname.strip_prefix("/v1") {
                req.pathname = rest.to_string();
            }
            Box::pin(async move { Ok(None) })
        })
        .get("/users", reply(200, "users"))
        .unwrap();

    assert_eq!(body(&dispatch(&owner, Method::GET, "/v1/users").await), "users");
}

#[tokio::test]
async fn test_params_are_visible_to_pre_handle() {
    let mut owner = RouteOwner::new();
    owner
        .pre_handle(|req, _meta| {
            let id = req.param("id").map(str::to_string);
            Box::pin(async move {
                match id.as_deref() {
                    Some("0") => Err(HttpError::bad_request("id must be positive").into()),
                    _ => Ok(None),
                }
            })
        })
        .get("/items/:id", reply(200, "item"))
        .unwrap();

    assert_eq!(dispatch(&owner, Method::GET, "/items/0").await.status(), 400);
    assert_eq!(dispatch(&owner, Method::GET, "/items/7").await.status(), 200);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_http_error_becomes_its_response() {
    let mut owner = RouteOwner::new();
    owner
        .get("/x", |_req| Box::pin(async move { Err(HttpError::not_found("missing").into()) }))
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/x").await;
    assert_eq!(res.status(), 404);
    assert_eq!(body(&res), "missing");
}

#[tokio::test]
async fn test_unclassified_error_becomes_generic_500() {
    let mut owner = RouteOwner::new();
    owner
        .get("/x", |_req| Box::pin(async move { Err(anyhow::anyhow!("database exploded")) }))
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/x").await;
    assert_eq!(res.status(), 500);
    assert_eq!(body(&res), INTERNAL_ERROR_MESSAGE);
    assert!(!body(&res).contains("database"));
}

#[tokio::test]
async fn test_error_with_context_is_still_classified() {
    let mut owner = RouteOwner::new();
    owner
        .get("/x", |_req| {
            Box::pin(async move {
                let err = anyhow::Error::new(HttpError::conflict("taken")).context("while saving");
                Err(err)
            })
        })
        .unwrap();

    assert_eq!(dispatch(&owner, Method::GET, "/x").await.status(), 409);
}

#[tokio::test]
async fn test_errors_from_every_hook_reach_error_path() {
    let mut owner = RouteOwner::new();
    owner
        .pre_route(|req| {
            let fail = req.pathname == "/pre-route/";
            Box::pin(async move {
                if fail {
                    return Err(HttpError::too_many_requests("slow down").into());
                }
                Ok(None)
            })
        })
        .post_handle(|req, _res, _meta| {
            let fail = req.pathname == "/post-handle/";
            Box::pin(async move {
                if fail {
                    anyhow::bail!("post handle failed");
                }
                Ok(None)
            })
        })
        .get("/pre-route", reply(200, ""))
        .unwrap()
        .get("/post-handle", reply(200, ""))
        .unwrap();

    assert_eq!(dispatch(&owner, Method::GET, "/pre-route").await.status(), 429);
    assert_eq!(dispatch(&owner, Method::GET, "/post-handle").await.status(), 500);
}

#[tokio::test]
async fn test_custom_error_handler_sees_classification() {
    let mut owner = RouteOwner::new();
    owner
        .set_error_handler(|err, _req, classified| {
            let text = match classified {
                Some(http) => format!("classified {} {}", http.status(), http.message()),
                None => format!("raw {err}"),
            };
            Box::pin(async move { Response::text(418, text) })
        })
        .get("/a", |_req| Box::pin(async move { Err(HttpError::bad_request("nope").into()) }))
        .unwrap()
        .get("/b", |_req| Box::pin(async move { Err(anyhow::anyhow!("kaput")) }))
        .unwrap();

    assert_eq!(
        body(&dispatch(&owner, Method::GET, "/a").await),
        "classified 400 nope"
    );
    assert_eq!(body(&dispatch(&owner, Method::GET, "/b").await), "raw kaput");
}

// ---------------------------------------------------------------------------
// Query parsing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_query_is_parsed_only_before_the_handler() {
    let mut owner = RouteOwner::new();
    owner
        .pre_handle(|req, _meta| {
            let seen = req.query.len();
            Box::pin(async move {
                assert_eq!(seen, 0, "query parsed before preHandle");
                Ok(None)
            })
        })
        .get("/search", |req| {
            Box::pin(async move {
                let q = req.query_param("q").unwrap_or_default().to_string();
                Ok(Response::text(200, q))
            })
        })
        .unwrap();

    let res = dispatch(&owner, Method::GET, "/search?q=a+b&x=1").await;
    assert_eq!(body(&res), "a b");
}

#[tokio::test]
async fn test_query_parsing_can_be_disabled_per_route_or_owner() {
    let handler = |req: &mut switchyard::Request| {
        let text = format!("{}|{}", req.query.len(), req.raw_query.as_deref().unwrap_or(""));
        Response::text(200, text)
    };
    let mut owner = RouteOwner::with_config(OwnerConfig::default().parse_query(false));
    owner
        .get("/off", move |req| {
            let res = handler(req);
            Box::pin(async move { Ok(res) })
        })
        .unwrap()
        .get_with("/on", RouteConfig::new().parse_query(true), move |req| {
            let res = handler(req);
            Box::pin(async move { Ok(res) })
        })
        .unwrap();

    assert_eq!(body(&dispatch(&owner, Method::GET, "/off?a=1").await), "0|a=1");
    assert_eq!(body(&dispatch(&owner, Method::GET, "/on?a=1").await), "1|a=1");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_owner_serves_concurrently() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let mut owner = RouteOwner::new();
    owner
        .get("/n/:n", move |req| {
            counter.fetch_add(1, Ordering::Relaxed);
            Box::pin(async move {
                tokio::task::yield_now().await;
                let n = req.param("n").unwrap_or_default().to_string();
                Ok(Response::text(200, n))
            })
        })
        .unwrap();
    let owner = Arc::new(owner);

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let owner = Arc::clone(&owner);
            tokio::spawn(async move {
                let mut req = request(Method::GET, &format!("/n/{i}"));
                let res = owner.dispatch(&mut req).await;
                (i, body(&res))
            })
        })
        .collect();

    for task in tasks {
        let (i, text) = task.await.unwrap();
        assert_eq!(text, i.to_string());
    }
    assert_eq!(hits.load(Ordering::Relaxed), 64);
}
