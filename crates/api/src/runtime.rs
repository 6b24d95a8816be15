//! Seams to the heavyweight runtime environment.
//!
//! - Dependency resolution (coordinates → classpath)
//! - Runtime start-up (classpath + options → session)
//! - Namespace loading inside a running session

use crate::error::StubResult;
use crate::models::{Coordinate, JavaClass, RuntimeValue, StartOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Resolves dependency coordinates onto a classpath.
pub trait DependencyResolver: Send + Sync {
    /// Resolver name (for logging/debugging)
    fn name(&self) -> &str;

    /// Check that the build tool this resolver drives is usable.
    fn ensure_available(&self) -> StubResult<()> {
        Ok(())
    }

    /// Resolve coordinates (and their transitive dependencies) to archives.
    fn resolve(&self, coordinates: &[Coordinate]) -> StubResult<Vec<PathBuf>>;
}

/// Starts the managed runtime.
///
/// A launcher is only ever asked to start once per process; restarting a
/// running runtime is not supported.
pub trait RuntimeLauncher: Send + Sync {
    /// Check that the runtime can be started at all.
    fn ensure_available(&self) -> StubResult<()> {
        Ok(())
    }

    fn start(
        &self,
        classpath: Vec<PathBuf>,
        options: StartOptions,
    ) -> StubResult<Arc<dyn RuntimeSession>>;
}

/// Handle to a running runtime.
pub trait RuntimeSession: Send + Sync {
    fn classpath(&self) -> &[PathBuf];

    fn options(&self) -> StartOptions;

    /// Load a package by dotted name. The empty name loads the top level.
    ///
    /// Fails with `NamespaceLoad` if the name is missing from the classpath
    /// or does not denote a package.
    fn load_namespace(&self, name: &str) -> StubResult<Arc<dyn NamespaceHandle>>;
}

/// A loaded package.
pub trait NamespaceHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Look up a class or sub-package directly below this namespace.
    fn attribute(&self, name: &str) -> Option<RuntimeValue>;

    /// Names of the classes and sub-packages directly below this namespace.
    fn members(&self) -> Vec<String>;

    /// Classes declared directly in this namespace.
    fn classes(&self) -> Vec<JavaClass>;

    /// Load a direct sub-package.
    fn subpackage(&self, name: &str) -> Option<Arc<dyn NamespaceHandle>>;

    /// Raw class file of a class declared directly in this namespace.
    fn class_bytes(&self, simple_name: &str) -> StubResult<Vec<u8>>;
}
