//! File store for a site's source assets.
//!
//! All reads are rooted below a single directory; request paths that would
//! escape the root resolve as not-found rather than touching the wider
//! filesystem. Reads are blocking by design: the resolution path assumes a
//! worker-per-request model.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::error::HttpError;

/// A byte-addressable file store keyed by paths drawn from a site's
/// resource tree.
#[derive(Debug, Clone)]
pub struct SiteResources {
    root: PathBuf,
}

impl SiteResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a site-relative path below the root, rejecting absolute
    /// paths and any `..` component.
    fn locate(&self, path: &Path) -> Option<PathBuf> {
        let mut located = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(part) => located.push(part),
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) | Component::ParentDir => {
                    return None;
                }
            }
        }
        Some(located)
    }

    /// Whether `path` names an existing regular file below the root.
    pub fn exists(&self, path: &Path) -> bool {
        self.locate(path).is_some_and(|p| p.is_file())
    }

    /// Reads file bytes.
    ///
    /// # Errors
    ///
    /// [`HttpError::NotFound`] for absent or escaping paths,
    /// [`HttpError::Io`] for any other read failure.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, HttpError> {
        let located = self.locate(path).ok_or(HttpError::NotFound)?;
        if located.is_dir() {
            return Err(HttpError::NotFound);
        }
        fs::read(&located).map_err(map_read_error)
    }

    /// Reads the file as UTF-8 text, normalizing CRLF line endings to LF.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read`]; non-UTF-8 content is an [`HttpError::Io`].
    pub fn read_text(&self, path: &Path) -> Result<String, HttpError> {
        let bytes = self.read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| HttpError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        Ok(text.replace("\r\n", "\n"))
    }

    /// The file's modification time, if the file exists and the platform
    /// reports one.
    pub fn last_modified(&self, path: &Path) -> Option<SystemTime> {
        let located = self.locate(path)?;
        fs::metadata(&located).ok()?.modified().ok()
    }
}

fn map_read_error(err: io::Error) -> HttpError {
    match err.kind() {
        io::ErrorKind::NotFound => HttpError::NotFound,
        _ => HttpError::Io(err),
    }
}
