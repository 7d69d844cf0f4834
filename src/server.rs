//! HTTP serving glue: route probing, payload dispatch and the axum adapter.
//!
//! The dispatch loop probes every route for a request, accumulates
//! candidate outcomes (success, wrong-method, not-found) and serves the
//! best one per [`crate::payload::rank`]. Resolution is blocking by design,
//! so the axum handler runs it under `spawn_blocking`.

use alloc::sync::Arc;
use core::convert::Infallible;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::io;
use std::path::PathBuf;

use axum::Router;
use axum::body::{Body as AxumBody, Bytes};
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::Response;
use eyre::WrapErr as _;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::{HttpError, error_page};
use crate::payload::Payload;
use crate::payload::rank::pick_best;
use crate::request::Request;
use crate::response::ResponseSink;
use crate::site::Site;

/// Largest request body the adapter will buffer for handlers.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

type HandlerFn = dyn Fn(&Request) -> Payload + Send + Sync;

struct Route {
    method: Method,
    path: String,
    handler: Box<HandlerFn>,
}

/// An ordered set of exact-path routes.
///
/// Pattern matching beyond exact paths is deliberately out of scope; the
/// static-file fallback covers the asset tree.
#[derive(Default)]
pub struct RouteSet {
    routes: Vec<Route>,
}

impl RouteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        mut self,
        method: Method,
        path: impl Into<String>,
        handler: impl Fn(&Request) -> Payload + Send + Sync + 'static,
    ) -> Self {
        self.routes.push(Route {
            method,
            path: path.into(),
            handler: Box::new(handler),
        });
        self
    }

    pub fn get(
        self,
        path: impl Into<String>,
        handler: impl Fn(&Request) -> Payload + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::GET, path, handler)
    }

    pub fn post(
        self,
        path: impl Into<String>,
        handler: impl Fn(&Request) -> Payload + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::POST, path, handler)
    }

    pub fn put(
        self,
        path: impl Into<String>,
        handler: impl Fn(&Request) -> Payload + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::PUT, path, handler)
    }

    pub fn delete(
        self,
        path: impl Into<String>,
        handler: impl Fn(&Request) -> Payload + Send + Sync + 'static,
    ) -> Self {
        self.route(Method::DELETE, path, handler)
    }

    /// One candidate per route whose path matches: the handler's outcome
    /// when the method applies, a bare 405 otherwise.
    fn candidates(&self, request: &Request) -> Vec<Payload> {
        self.routes
            .iter()
            .filter(|route| route.path == request.path())
            .map(|route| {
                if method_applies(&route.method, request.method()) {
                    (route.handler)(request)
                } else {
                    Payload::method_not_allowed()
                }
            })
            .collect()
    }
}

/// HEAD is served by GET routes; headers only, handled at write time.
fn method_applies(route_method: &Method, request_method: &Method) -> bool {
    route_method == request_method
        || (*route_method == Method::GET && *request_method == Method::HEAD)
}

/// A site plus its routes: the complete serving surface.
pub struct SiteServer {
    site: Site,
    routes: RouteSet,
}

impl SiteServer {
    pub fn new(site: Site, routes: RouteSet) -> Self {
        Self { site, routes }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Probes all routes and the static asset tree, returning the best
    /// candidate only after every one has been considered.
    pub fn apply(&self, request: &Request) -> Payload {
        let mut candidates = self.routes.candidates(request);
        if let Some(static_file) = self.static_candidate(request) {
            candidates.push(static_file);
        }
        pick_best(candidates)
    }

    /// GET/HEAD requests fall through to the site's resource tree;
    /// directory-style paths probe their `index.html`.
    fn static_candidate(&self, request: &Request) -> Option<Payload> {
        if !matches!(*request.method(), Method::GET | Method::HEAD) {
            return None;
        }
        let mut relative = request.path().trim_start_matches('/').to_string();
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str("index.html");
        }
        let path = PathBuf::from(relative);
        self.site
            .resources()
            .exists(&path)
            .then(|| Payload::file(path))
    }

    /// Serves one request end to end, converting resolution failures into
    /// error pages. Never lets a failure escape to the transport; a
    /// double fault while producing the error page is swallowed with a
    /// warning.
    pub fn respond(&self, request: &Request) -> Response {
        let payload = self.apply(request);

        let mut sink = BufferedResponse::default();
        match payload.write_to(&self.site, request, &mut sink) {
            Ok(()) => sink.into_response(),
            Err(e) => {
                match e {
                    HttpError::Compilation(ref compile_err) => {
                        warn!(path = request.path(), error = %compile_err, "compilation failed");
                    }
                    HttpError::Io(ref io_err) => {
                        error!(path = request.path(), error = %io_err, "i/o fault during resolution");
                    }
                    HttpError::NotFound => {}
                }
                self.respond_with_error_page(&e, request)
            }
        }
    }

    fn respond_with_error_page(&self, err: &HttpError, request: &Request) -> Response {
        let mut sink = BufferedResponse::default();
        match self.write_error_page(err, request, &mut sink) {
            Ok(()) => sink.into_response(),
            Err(_) => plain_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Second resolution attempt after a failure. A fault here is the
    /// double fault: logged and reported to the caller, never propagated
    /// further up.
    fn write_error_page(
        &self,
        err: &HttpError,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), HttpError> {
        error_page(err, self.site.dev_mode())
            .write_to(&self.site, request, sink)
            .inspect_err(|second| warn!(error = %second, "unable to serve an error page"))
    }
}

/// Response sink buffering into an in-memory `http` response.
#[derive(Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: Vec<(HeaderName, HeaderValue)>,
    content_length: Option<u64>,
    body: Option<Vec<u8>>,
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn set_header(&mut self, name: &HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(parsed) => self.headers.push((name.clone(), parsed)),
            Err(e) => warn!(%name, error = %e, "dropping invalid header value"),
        }
    }

    fn set_content_length(&mut self, length: u64) {
        self.content_length = Some(length);
    }

    fn body_writer(&mut self) -> io::Result<&mut dyn io::Write> {
        Ok(self.body.get_or_insert_with(Vec::new))
    }
}

impl BufferedResponse {
    fn into_response(self) -> Response {
        let mut builder = Response::builder().status(self.status.unwrap_or(StatusCode::OK));
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        if let Some(length) = self.content_length {
            builder = builder.header(header::CONTENT_LENGTH, length);
        }
        let body = match self.body {
            Some(bytes) => AxumBody::from(bytes),
            // 304 and HEAD finish without opening the body or declaring a
            // length; the routing layer derives `content-length` from any
            // exactly-sized body, so give them one it cannot size
            None if self.content_length.is_none() => AxumBody::new(UnsizedEmpty),
            None => AxumBody::empty(),
        };
        builder.body(body).unwrap_or_else(|e| {
            warn!(error = %e, "unable to assemble response");
            plain_status(StatusCode::INTERNAL_SERVER_ERROR)
        })
    }
}

/// Empty response body with a non-exact size hint.
struct UnsizedEmpty;

impl http_body::Body for UnsizedEmpty {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(None)
    }

    fn is_end_stream(&self) -> bool {
        true
    }
}

fn plain_status(status: StatusCode) -> Response {
    let mut response = Response::new(AxumBody::empty());
    *response.status_mut() = status;
    response
}

/// The axum application: every request falls through to the dispatch loop.
pub fn router(server: SiteServer) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(Arc::new(server))
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(
    State(server): State<Arc<SiteServer>>,
    request: axum::extract::Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "unable to buffer request body");
            return plain_status(StatusCode::PAYLOAD_TOO_LARGE);
        }
    };
    let request = Request::new(parts.method, parts.uri.path(), parts.headers, bytes.to_vec());

    // worker-per-request: resolution blocks on file reads and compilers
    let result = tokio::task::spawn_blocking(move || server.respond(&request)).await;
    match result {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "request worker failed");
            plain_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Binds and serves until the task is cancelled.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server loop fails.
pub async fn serve(server: SiteServer, bind: &str, port: u16) -> eyre::Result<()> {
    let app = router(server);
    let listener = TcpListener::bind((bind, port))
        .await
        .wrap_err(format!("Unable to bind {bind}:{port}"))?;
    info!(%bind, port, "server started");
    axum::serve(listener, app).await.wrap_err("server loop failed")
}
