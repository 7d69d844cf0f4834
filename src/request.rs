//! Request abstraction consumed by the resolution pipeline.
//!
//! A snapshot of the pieces the pipeline needs: method, path, headers
//! (notably `If-None-Match`) and the already-read body bytes. Cookie values
//! set through [`crate::payload::Payload::with_json_cookie`] read back by
//! requested type.

use axum::http::{HeaderMap, HeaderName, Method};
use cookie::Cookie;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body,
        }
    }

    /// A bare GET, mostly useful in tests.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, HeaderMap::new(), Vec::new())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// First value of `name`, when it decodes as visible ASCII.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw (percent-decoded) value of the named cookie.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.header(&axum::http::header::COOKIE)?;
        Cookie::split_parse_encoded(header.to_string())
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Decodes the named cookie's JSON value into the requested type.
    pub fn json_cookie<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.cookie(name)?;
        serde_json::from_str(&value).ok()
    }
}
