//! Shared per-site services handed to the resolution pipeline.

use std::path::Path;

use crate::compile::{CompileCache, CompilerRegistry};
use crate::resources::SiteResources;

/// Everything resolution needs besides the payload itself: the source
/// asset tree and the compile cache in front of it.
///
/// Created once at startup and shared across request workers; there is no
/// implicit singleton.
pub struct Site {
    resources: SiteResources,
    compilers: CompileCache,
    dev_mode: bool,
}

impl Site {
    pub fn new(root: impl AsRef<Path>, cache_dir: impl AsRef<Path>) -> Self {
        Self {
            resources: SiteResources::new(root.as_ref()),
            compilers: CompileCache::new(cache_dir.as_ref(), CompilerRegistry::with_defaults()),
            dev_mode: false,
        }
    }

    pub fn with_compilers(mut self, compilers: CompileCache) -> Self {
        self.compilers = compilers;
        self
    }

    /// In dev mode compiler diagnostics are rendered into error pages
    /// instead of being suppressed.
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn resources(&self) -> &SiteResources {
        &self.resources
    }

    pub fn compilers(&self) -> &CompileCache {
        &self.compilers
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }
}
