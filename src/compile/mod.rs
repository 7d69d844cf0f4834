//! On-demand source compilation with a content-addressed cache.
//!
//! [`CompileCache`] fronts the [`CompilerRegistry`]: results are keyed by a
//! digest of `(path, content)`, computed at most once per key across
//! concurrent callers, and persisted so process restarts do not repeat
//! compilation for unchanged inputs. A changed source produces a new key, so
//! entries are never invalidated.

pub mod asciidoc;
pub mod coffee;
pub mod less;
pub mod markdown;
mod registry;

pub use registry::{CompileError, Compiler, CompilerRegistry};

use alloc::sync::Arc;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use sha2::{Digest as _, Sha256};
use tracing::debug;

type CacheSlot = Arc<OnceLock<Result<String, CompileError>>>;

/// Compile-and-cache service carrying its own cache directory.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
pub struct CompileCache {
    registry: CompilerRegistry,
    cache_dir: PathBuf,
    inflight: Mutex<HashMap<String, CacheSlot>>,
}

impl CompileCache {
    pub fn new(cache_dir: impl Into<PathBuf>, registry: CompilerRegistry) -> Self {
        Self {
            registry,
            cache_dir: cache_dir.into(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// The output extension of the compiler registered for `path`, or
    /// `None` when the path passes through untransformed.
    pub fn output_extension(&self, path: &Path) -> Option<&'static str> {
        self.registry.find(path).map(Compiler::output_extension)
    }

    /// Compiles `content`, reusing a cached result when one exists.
    ///
    /// Same inputs always yield the same output. Concurrent callers for an
    /// identical `(path, content)` observe a single compilation; all of
    /// them receive the identical result. Content without a registered
    /// compiler passes through unchanged and is not charged a cache entry.
    ///
    /// # Errors
    ///
    /// [`CompileError::Source`] when the compiler rejects the input,
    /// [`CompileError::Cache`] when the persistent store misbehaves.
    ///
    /// # Panics
    ///
    /// Panics if the in-flight lock was poisoned by a panicking compiler.
    pub fn compile(&self, path: &Path, content: &str) -> Result<String, CompileError> {
        let Some(compiler) = self.registry.find(path) else {
            return Ok(content.to_string());
        };

        let key = cache_key(path, content);
        let slot = {
            let mut inflight = self
                .inflight
                .lock()
                .expect("compile cache lock poisoned");
            inflight.entry(key.clone()).or_default().clone()
        };

        // First caller for the key runs the closure; concurrent callers for
        // the same key block inside get_or_init until it completes.
        slot.get_or_init(|| self.load_or_compile(&key, compiler, path, content))
            .clone()
    }

    fn load_or_compile(
        &self,
        key: &str,
        compiler: &dyn Compiler,
        path: &Path,
        content: &str,
    ) -> Result<String, CompileError> {
        let entry = self.cache_dir.join(key);

        match fs::read(&entry) {
            Ok(bytes) => {
                debug!(path = %path.display(), %key, "compile cache hit");
                return String::from_utf8(bytes)
                    .map_err(|_| CompileError::Cache(format!("corrupt cache entry {key}")));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(CompileError::Cache(e.to_string())),
        }

        debug!(path = %path.display(), %key, "compiling");
        let compiled = compiler.compile(path, content)?;

        // A concurrent process may have created the directory already;
        // that is only a failure if the directory still does not exist.
        if let Err(e) = fs::create_dir_all(&self.cache_dir) {
            if !self.cache_dir.is_dir() {
                return Err(CompileError::Cache(format!(
                    "unable to create cache folder {}: {e}",
                    self.cache_dir.display()
                )));
            }
        }
        fs::write(&entry, compiled.as_bytes()).map_err(|e| CompileError::Cache(e.to_string()))?;

        Ok(compiled)
    }
}

/// Stable, collision-resistant digest naming the persisted cache file.
fn cache_key(path: &Path, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(b";");
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
