//! The unit of response resolution.
//!
//! A [`Payload`] is the resolved result of handling one request, before it
//! is serialized to the wire: a status code, an optionally-typed body of
//! heterogeneous kind, and headers/cookies appended until [`Payload::write_to`]
//! finalizes it. Payloads are constructed once per route outcome and never
//! reused across requests.

pub mod conditional;
pub mod rank;
mod resolve;

use std::io::Read;
use std::path::PathBuf;

use axum::http::{HeaderName, Method, StatusCode, header};
use cookie::Cookie;
use serde::Serialize;
use tracing::warn;

use crate::error::HttpError;
use crate::payload::conditional::{Validation, etag_for, http_date, validate};
use crate::request::Request;
use crate::response::ResponseSink;
use crate::site::Site;

/// Body kinds a route outcome can carry.
pub enum Body {
    Empty,
    /// UTF-8 text, `text/html; charset=UTF-8` unless typed explicitly.
    Text(String),
    /// Opaque bytes, `application/octet-stream` unless typed explicitly.
    Bytes(Vec<u8>),
    /// Pre-serialized JSON (field order = declaration order).
    Json(Vec<u8>),
    /// An open byte stream, drained fully on resolution.
    Stream(Box<dyn Read + Send>),
    /// A path into the site's resource tree, possibly compiled on read.
    File(PathBuf),
}

impl core::fmt::Debug for Body {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match *self {
            Self::Empty => "Empty",
            Self::Text(_) => "Text",
            Self::Bytes(_) => "Bytes",
            Self::Json(_) => "Json",
            Self::Stream(_) => "Stream",
            Self::File(_) => "File",
        };
        f.write_str(kind)
    }
}

/// A route outcome awaiting serialization.
#[derive(Debug)]
pub struct Payload {
    status: StatusCode,
    content_type: Option<String>,
    body: Body,
    headers: Vec<(HeaderName, String)>,
    cookies: Vec<Cookie<'static>>,
}

impl Payload {
    fn with_body(status: StatusCode, body: Body) -> Self {
        Self {
            status,
            content_type: None,
            body,
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }

    /// An empty payload with the given status.
    pub fn empty(status: StatusCode) -> Self {
        Self::with_body(status, Body::Empty)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_body(StatusCode::OK, Body::Text(text.into()))
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_body(StatusCode::OK, Body::Bytes(bytes.into()))
    }

    /// Serializes `value` to JSON eagerly, preserving declaration order of
    /// struct fields. A value that cannot be serialized becomes a 500.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => Self::with_body(StatusCode::OK, Body::Json(bytes)),
            Err(e) => {
                warn!(error = %e, "unable to serialize payload to JSON");
                Self::empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// A stream body. The content type is required since a stream carries
    /// no extension to infer one from.
    pub fn stream(content_type: impl Into<String>, reader: Box<dyn Read + Send>) -> Self {
        Self::with_body(StatusCode::OK, Body::Stream(reader)).with_content_type(content_type)
    }

    /// A file from the site's resource tree, compiled on resolution when a
    /// compiler claims its extension.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_body(StatusCode::OK, Body::File(path.into()))
    }

    /// An HTML body carrying a non-200 status, as used by error pages.
    pub fn html(status: StatusCode, html: impl Into<String>) -> Self {
        Self::with_body(status, Body::Text(html.into()))
    }

    pub fn ok() -> Self {
        Self::empty(StatusCode::OK)
    }

    pub fn not_found() -> Self {
        Self::empty(StatusCode::NOT_FOUND)
    }

    pub fn forbidden() -> Self {
        Self::empty(StatusCode::FORBIDDEN)
    }

    pub fn unauthorized() -> Self {
        Self::empty(StatusCode::UNAUTHORIZED)
    }

    pub fn method_not_allowed() -> Self {
        Self::empty(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub fn see_other(url: impl Into<String>) -> Self {
        Self::empty(StatusCode::SEE_OTHER).with_header(header::LOCATION, url)
    }

    pub fn moved_permanently(url: impl Into<String>) -> Self {
        Self::empty(StatusCode::MOVED_PERMANENTLY).with_header(header::LOCATION, url)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Appends a header. Last write wins for conflicting semantics
    /// (a later `Location` overrides an earlier one on the wire).
    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Attaches a cookie whose value is the JSON encoding of `value`;
    /// [`crate::request::Request::json_cookie`] reads it back by type.
    pub fn with_json_cookie<T: Serialize>(self, name: impl Into<String>, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => self.with_cookie(Cookie::build((name.into(), json)).build()),
            Err(e) => {
                warn!(error = %e, "unable to serialize cookie value");
                self
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn headers(&self) -> &[(HeaderName, String)] {
        &self.headers
    }

    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }

    /// Redirects and empty-body statuses carry no entity at all.
    fn has_no_content(&self) -> bool {
        matches!(self.body, Body::Empty)
            || self.status.is_redirection()
            || matches!(
                self.status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::METHOD_NOT_ALLOWED
            )
    }

    /// Writes this payload to the response sink: the sole side-effecting
    /// entry point.
    ///
    /// Resolves the body, applies conditional-GET validation and emits
    /// status, headers, cookies and (except for HEAD and bodiless
    /// outcomes) the entity itself. An absent or missing body is written
    /// as an empty 404, never surfaced as a fault.
    ///
    /// # Errors
    ///
    /// [`HttpError::Compilation`] and [`HttpError::Io`] propagate so the
    /// serving layer can convert them into an error page.
    pub fn write_to(
        self,
        site: &Site,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), HttpError> {
        // insertion order preserved, last write per name wins
        for (index, (name, value)) in self.headers.iter().enumerate() {
            let superseded = self.headers.iter().skip(index + 1).any(|(n, _)| n == name);
            if !superseded {
                sink.set_header(name, value);
            }
        }
        for cookie in &self.cookies {
            sink.add_cookie(cookie);
        }

        if self.has_no_content() {
            sink.set_status(self.status);
            sink.set_content_length(0);
            return Ok(());
        }

        let status = self.status;
        let resolved =
            match resolve::resolve(self.body, self.content_type, request.path(), site) {
                Ok(resolved) => resolved,
                Err(HttpError::NotFound) => {
                    sink.set_status(StatusCode::NOT_FOUND);
                    sink.set_content_length(0);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

        if let Some(modified) = resolved.last_modified {
            sink.set_header(&header::LAST_MODIFIED, &http_date(modified));
        }

        if status.is_success() {
            let etag = etag_for(&resolved.bytes);
            sink.set_header(&header::ETAG, &etag);
            let validator = request.header(&header::IF_NONE_MATCH);
            if validate(&etag, validator) == Validation::NotModified {
                sink.set_status(StatusCode::NOT_MODIFIED);
                return Ok(());
            }
        }

        sink.set_status(status);
        sink.set_header(&header::CONTENT_TYPE, &resolved.content_type);

        if request.method() == Method::HEAD {
            return Ok(());
        }

        sink.set_content_length(resolved.bytes.len() as u64);
        sink.body_writer()?.write_all(&resolved.bytes)?;
        Ok(())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::bytes(bytes)
    }
}

impl From<PathBuf> for Payload {
    fn from(path: PathBuf) -> Self {
        Self::file(path)
    }
}

/// An absent optional value is equivalent to a 404 with an empty body,
/// regardless of any declared content type.
impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Self::not_found(),
        }
    }
}
