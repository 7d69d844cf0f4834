//! Suffix-dispatched compiler registry.
//!
//! Maps file-name suffixes (including multi-dot suffixes such as `.css.map`)
//! to lazily-constructed, reusable compiler instances. Lookup walks entries
//! in registration order and the first matching suffix wins, so multi-part
//! suffixes must be registered ahead of their shorter tails.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error as ThisError;

use crate::compile::asciidoc::AsciidocCompiler;
use crate::compile::coffee::CoffeeCompiler;
use crate::compile::less::{LessCompiler, LessSourceMapCompiler};
use crate::compile::markdown::MarkdownCompiler;

/// Errors produced by compilers and the cache that fronts them.
///
/// `Clone` so a memoized result can be handed to every single-flight waiter.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CompileError {
    /// The transformer rejected the source. Carries the source location so
    /// the caller can render a diagnostic rather than a blank page.
    #[error("unable to compile {}: {message}", path.display())]
    Source { path: PathBuf, message: String },

    /// The cache store itself failed (uncreatable directory, unreadable
    /// entry).
    #[error("compile cache: {0}")]
    Cache(String),
}

impl CompileError {
    pub(crate) fn source(path: &Path, message: impl Into<String>) -> Self {
        Self::Source {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// A source-to-source transformer for one family of file suffixes.
///
/// Instances are reusable and shared across requests, so implementations
/// must be stateless or internally synchronized.
pub trait Compiler: Send + Sync {
    /// Transforms `source` into compiled text.
    ///
    /// # Errors
    ///
    /// [`CompileError::Source`] when the input is rejected.
    fn compile(&self, path: &Path, source: &str) -> Result<String, CompileError>;

    /// Extension of the produced asset (`"js"`, `"html"`), used to derive
    /// the served content type.
    fn output_extension(&self) -> &'static str;
}

type Factory = Box<dyn Fn() -> Box<dyn Compiler> + Send + Sync>;

struct Registration {
    suffixes: Vec<String>,
    factory: Factory,
    instance: OnceLock<Box<dyn Compiler>>,
}

/// Ordered mapping from file suffix to compiler.
pub struct CompilerRegistry {
    registrations: Vec<Registration>,
}

impl CompilerRegistry {
    /// A registry with no compilers; everything passes through unchanged.
    pub fn empty() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// The stock registry: CoffeeScript-style sources, markdown, less (with
    /// its source-map endpoint) and asciidoc.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(&[".coffee", ".litcoffee"], || Box::new(CoffeeCompiler));
        registry.register(&[".md", ".markdown"], || Box::new(MarkdownCompiler));
        // `.css.map` stays ahead of any later `.map` registration
        registry.register(&[".css.map"], || Box::new(LessSourceMapCompiler));
        registry.register(&[".less"], || Box::new(LessCompiler));
        registry.register(&[".asciidoc"], || Box::new(AsciidocCompiler));
        registry
    }

    /// Registers a compiler for the given suffixes. The factory runs at
    /// most once, on first use. Register longer suffixes before any entry
    /// owning one of their tails (`.css.map` before `.map`).
    pub fn register(
        &mut self,
        suffixes: &[&str],
        factory: impl Fn() -> Box<dyn Compiler> + Send + Sync + 'static,
    ) {
        self.registrations.push(Registration {
            suffixes: suffixes.iter().map(ToString::to_string).collect(),
            factory: Box::new(factory),
            instance: OnceLock::new(),
        });
    }

    /// The compiler registered for the first suffix matching `path`, if any.
    pub fn find(&self, path: &Path) -> Option<&dyn Compiler> {
        let name = path.to_string_lossy();
        self.registrations
            .iter()
            .find(|r| r.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())))
            .map(|r| r.instance.get_or_init(|| (r.factory)()).as_ref())
    }
}
