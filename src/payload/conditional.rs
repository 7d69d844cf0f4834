//! Conditional-GET validation.
//!
//! The entity tag is the hex MD5 of the exact resolved bytes; a request
//! presenting that tag in `If-None-Match` gets a bodiless 304. Matching is
//! exact-string against the computed tag.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use md5::{Digest as _, Md5};

/// Whether to serve the full body or short-circuit to 304.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Full,
    NotModified,
}

/// Entity tag for a resolved body: lowercase hex MD5 over the exact bytes.
pub fn etag_for(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Compares the request's validator against the computed tag.
pub fn validate(etag: &str, if_none_match: Option<&str>) -> Validation {
    if if_none_match == Some(etag) {
        Validation::NotModified
    } else {
        Validation::Full
    }
}

/// Formats a timestamp as an RFC 7231 HTTP-date for `Last-Modified`.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
