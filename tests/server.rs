//! End-to-end tests driving the assembled router in-process.

use std::env;
use std::fs;
use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{Request as HttpRequest, Response, StatusCode, header};
use http_body_util::BodyExt as _;
use tower::ServiceExt as _;

use kiln::server::{self, RouteSet, SiteServer};
use kiln::{Payload, Site};

fn test_site(name: &str, files: &[(&str, &str)]) -> (Site, PathBuf) {
    let base = env::temp_dir().join(format!("kiln_e2e_{name}"));
    drop(fs::remove_dir_all(&base));
    let root = base.join("site");
    fs::create_dir_all(&root).unwrap();
    for (path, content) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, content).unwrap();
    }
    (Site::new(root, base.join("cache")), base)
}

fn test_router(name: &str, files: &[(&str, &str)], routes: RouteSet) -> Router {
    let (site, _base) = test_site(name, files);
    server::router(SiteServer::new(site, routes))
}

async fn send(app: &Router, request: HttpRequest<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn get(path: &str) -> HttpRequest<Body> {
    HttpRequest::get(path).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn route_outcome_is_served_with_validators() {
    let app = test_router(
        "route",
        &[],
        RouteSet::new().get("/hello", |_| "Hello".into()),
    );

    let response = send(&app, get("/hello")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=UTF-8"
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
    assert_eq!(
        response.headers()[header::ETAG],
        "8b1a9953c4611296a827abf8c47804d7"
    );
    assert_eq!(body_bytes(response).await, b"Hello");
}

#[tokio::test]
async fn matching_etag_short_circuits_to_not_modified() {
    let app = test_router(
        "etag",
        &[],
        RouteSet::new().get("/hello", |_| "Hello".into()),
    );

    let first = send(&app, get("/hello")).await;
    let etag = first.headers()[header::ETAG].to_str().unwrap().to_string();

    let conditional = HttpRequest::get("/hello")
        .header(header::IF_NONE_MATCH, etag)
        .body(Body::empty())
        .unwrap();
    let second = send(&app, conditional).await;

    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert!(second.headers().get(header::CONTENT_LENGTH).is_none());
    assert!(body_bytes(second).await.is_empty());
}

#[tokio::test]
async fn head_carries_headers_but_no_body() {
    let app = test_router(
        "head",
        &[],
        RouteSet::new().get("/hello", |_| "Hello".into()),
    );

    let request = HttpRequest::head("/hello").body(Body::empty()).unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=UTF-8"
    );
    assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn wrong_method_is_405_unless_a_better_candidate_exists() {
    let app = test_router(
        "methods",
        &[],
        RouteSet::new()
            .get("/only-get", |_| "hi".into())
            .post("/both", |_| Payload::ok())
            .get("/both", |_| "hi".into()),
    );

    let post = HttpRequest::post("/only-get")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        send(&app, post).await.status(),
        StatusCode::METHOD_NOT_ALLOWED
    );

    assert_eq!(send(&app, get("/both")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_path_is_an_empty_404() {
    let app = test_router("missing", &[], RouteSet::new());

    let response = send(&app, get("/nope")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn static_assets_are_served_with_their_content_type() {
    let app = test_router(
        "static",
        &[("style.css", "body { margin: 0 }\n")],
        RouteSet::new(),
    );

    let response = send(&app, get("/style.css")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/css; charset=UTF-8"
    );
    assert!(response.headers().contains_key(header::LAST_MODIFIED));
    assert_eq!(body_bytes(response).await, b"body { margin: 0 }\n");
}

#[tokio::test]
async fn source_assets_are_served_compiled() {
    let app = test_router(
        "compiled",
        &[("js/app.coffee", "life=42"), ("hello.md", "Hello")],
        RouteSet::new(),
    );

    let script = send(&app, get("/js/app.coffee")).await;
    assert_eq!(script.status(), StatusCode::OK);
    assert_eq!(
        script.headers()[header::CONTENT_TYPE],
        "application/javascript; charset=UTF-8"
    );
    assert_eq!(body_bytes(script).await, b"var life;\n\nlife = 42;\n");

    let page = send(&app, get("/hello.md")).await;
    assert_eq!(
        page.headers()[header::CONTENT_TYPE],
        "text/html; charset=UTF-8"
    );
    assert_eq!(body_bytes(page).await, b"<p>Hello</p>\n");
}

#[tokio::test]
async fn stylesheet_sources_compile_to_css() {
    let app = test_router(
        "less",
        &[("css/style.less", "@color: #336699;\na { color: @color; }\n")],
        RouteSet::new(),
    );

    let response = send(&app, get("/css/style.less")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/css; charset=UTF-8"
    );
    assert_eq!(body_bytes(response).await, b"a { color: #336699; }\n");
}

#[tokio::test]
async fn oversized_request_body_is_rejected() {
    let app = test_router(
        "oversized",
        &[],
        RouteSet::new().post("/echo", |request| {
            String::from_utf8_lossy(request.body()).into_owned().into()
        }),
    );

    let request = HttpRequest::post("/echo")
        .body(Body::from(vec![b'a'; 3 * 1024 * 1024]))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn broken_source_asset_is_a_500() {
    let app = test_router("broken", &[("bad.coffee", "===")], RouteSet::new());

    let response = send(&app, get("/bad.coffee")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("Internal Server Error"));
    assert!(!body.contains("unable to compile"));
}

#[tokio::test]
async fn dev_mode_renders_the_compiler_diagnostic() {
    let (site, _base) = test_site("broken_dev", &[("bad.coffee", "===")]);
    let app = server::router(SiteServer::new(
        site.with_dev_mode(true),
        RouteSet::new(),
    ));

    let response = send(&app, get("/bad.coffee")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("unable to compile"));
}

#[tokio::test]
async fn redirect_payloads_have_no_content() {
    let app = test_router(
        "redirect",
        &[],
        RouteSet::new().get("/old", |_| Payload::see_other("/new")),
    );

    let response = send(&app, get("/old")).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/new");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn handlers_see_the_request_body() {
    let app = test_router(
        "echo",
        &[],
        RouteSet::new().post("/echo", |request| {
            String::from_utf8_lossy(request.body()).into_owned().into()
        }),
    );

    let request = HttpRequest::post("/echo")
        .body(Body::from("ping"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ping");
}
