//! Error taxonomy for payload resolution.
//!
//! `NotFound` is an expected outcome and maps to an empty 404; compilation
//! failures and I/O faults are converted to 500-class responses by the
//! serving layer instead of escaping the worker.

use axum::http::StatusCode;
use thiserror::Error as ThisError;

use crate::compile::CompileError;
use crate::payload::Payload;

/// Failure modes on the resolution path.
#[derive(Debug, ThisError)]
pub enum HttpError {
    /// Absent optional body, missing file, or no matching route.
    /// Never logged as an error.
    #[error("not found")]
    NotFound,

    /// A registered compiler rejected the source.
    #[error(transparent)]
    Compilation(CompileError),

    /// File unreadable for reasons other than absence, or a sink write
    /// failure. Fatal for the current request only.
    #[error("i/o fault")]
    Io(#[from] std::io::Error),
}

impl From<CompileError> for HttpError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Source { .. } => Self::Compilation(err),
            CompileError::Cache(message) => {
                Self::Io(std::io::Error::other(message))
            }
        }
    }
}

/// Converts a resolution failure into a servable payload.
///
/// In dev mode compilation diagnostics are rendered into the page; in
/// production they are suppressed and only the generic page is served.
pub fn error_page(err: &HttpError, dev_mode: bool) -> Payload {
    match *err {
        HttpError::NotFound => Payload::not_found(),
        HttpError::Compilation(ref compile_err) if dev_mode => Payload::html(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!(
                "<h1>Compilation error</h1>\n<pre>{}</pre>\n",
                escape_html(&compile_err.to_string())
            ),
        ),
        HttpError::Compilation(_) | HttpError::Io(_) => Payload::html(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<h1>Internal Server Error</h1>\n",
        ),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
