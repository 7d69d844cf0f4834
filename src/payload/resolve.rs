//! Content resolution: maps a body to bytes plus a negotiated content type.
//!
//! File-backed bodies go through the compile cache; when a compiler claims
//! the path, the served content type comes from the compiler's *output*
//! extension, not the source extension.

use std::io::Read as _;
use std::time::SystemTime;

use crate::error::HttpError;
use crate::payload::Body;
use crate::site::Site;

const TEXT_HTML: &str = "text/html; charset=UTF-8";
const APPLICATION_JSON: &str = "application/json; charset=UTF-8";

pub(crate) struct Resolved {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub last_modified: Option<SystemTime>,
}

/// Resolves `body` to wire bytes.
///
/// `request_path` is only a typing fallback for bodies that carry no
/// extension of their own (raw bytes, streams).
pub(crate) fn resolve(
    body: Body,
    explicit_type: Option<String>,
    request_path: &str,
    site: &Site,
) -> Result<Resolved, HttpError> {
    match body {
        Body::Empty => Err(HttpError::NotFound),

        Body::Text(text) => Ok(Resolved {
            bytes: text.into_bytes(),
            content_type: explicit_type.unwrap_or_else(|| TEXT_HTML.to_string()),
            last_modified: None,
        }),

        Body::Bytes(bytes) => Ok(Resolved {
            bytes,
            content_type: explicit_type
                .unwrap_or_else(|| content_type_for_name(request_path).to_string()),
            last_modified: None,
        }),

        Body::Json(bytes) => Ok(Resolved {
            bytes,
            content_type: explicit_type.unwrap_or_else(|| APPLICATION_JSON.to_string()),
            last_modified: None,
        }),

        Body::Stream(mut reader) => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).map_err(HttpError::Io)?;
            Ok(Resolved {
                bytes,
                content_type: explicit_type
                    .unwrap_or_else(|| content_type_for_name(request_path).to_string()),
                last_modified: None,
            })
        }

        Body::File(path) => {
            let last_modified = site.resources().last_modified(&path);
            if let Some(output_extension) = site.compilers().output_extension(&path) {
                let source = site.resources().read_text(&path)?;
                let compiled = site.compilers().compile(&path, &source)?;
                Ok(Resolved {
                    bytes: compiled.into_bytes(),
                    content_type: explicit_type
                        .unwrap_or_else(|| content_type_for_extension(output_extension).to_string()),
                    last_modified,
                })
            } else {
                let bytes = site.resources().read(&path)?;
                let name = path.to_string_lossy();
                Ok(Resolved {
                    bytes,
                    content_type: explicit_type
                        .unwrap_or_else(|| content_type_for_name(&name).to_string()),
                    last_modified,
                })
            }
        }
    }
}

fn content_type_for_name(name: &str) -> &'static str {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    // a leading dot is a hidden-file marker, not an extension separator
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => content_type_for_extension(extension),
        _ => content_type_for_extension(""),
    }
}

/// Extension to MIME mapping; compiled source extensions map to the type
/// of their compiled form.
pub(crate) fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "html" | "htm" | "md" | "markdown" | "asciidoc" => TEXT_HTML,
        "css" | "less" => "text/css; charset=UTF-8",
        "js" | "mjs" | "coffee" | "litcoffee" => "application/javascript; charset=UTF-8",
        "json" | "map" => APPLICATION_JSON,
        "txt" => "text/plain; charset=UTF-8",
        "xml" => "application/xml; charset=UTF-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => mime::APPLICATION_OCTET_STREAM.as_ref(),
    }
}
