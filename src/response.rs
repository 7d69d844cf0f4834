//! Response sink abstraction.
//!
//! The transport hands the pipeline something it can write status, headers
//! and a body into. The body writer is opened on demand, so a HEAD response
//! can complete without the sink ever being opened for writing.

use std::io::{self, Write};

use axum::http::{HeaderName, StatusCode, header};
use cookie::Cookie;

pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);

    /// Sets a header. May be called repeatedly with the same name.
    fn set_header(&mut self, name: &HeaderName, value: &str);

    fn set_content_length(&mut self, length: u64);

    /// Opens (on first call) and returns the body writer.
    ///
    /// # Errors
    ///
    /// Any I/O fault from the underlying transport.
    fn body_writer(&mut self) -> io::Result<&mut dyn Write>;

    /// Appends a `Set-Cookie` header, percent-encoding the cookie value.
    fn add_cookie(&mut self, cookie: &Cookie<'static>) {
        self.set_header(&header::SET_COOKIE, &cookie.encoded().to_string());
    }
}
