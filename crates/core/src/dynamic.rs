//! Lazy attribute access for runtime shim modules.
//!
//! A shim module calls [`dynamic_import`] with its own name, file and the
//! coordinates its stubs were generated from. It gets back the export list
//! (read statically from the neighbouring `.pyi`, so no runtime is needed)
//! and a [`LazyModule`] that starts the runtime on first attribute access.

use crate::bootstrap::Environment;
use crate::stubfile;
use jstubs_api::{Coordinate, NamespaceHandle, RuntimeValue, StubError, StubResult};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModuleState {
    Unbootstrapped,
    Bootstrapping,
    Bootstrapped,
}

pub struct LazyModule {
    environment: Arc<Environment>,
    module_name: String,
    stub_path: PathBuf,
    coordinates: Vec<Coordinate>,
    exports: Vec<String>,
    namespace: OnceCell<Arc<dyn NamespaceHandle>>,
    cache: Mutex<HashMap<String, Arc<RuntimeValue>>>,
    state: Mutex<ModuleState>,
}

/// Back a shim module with the process-wide environment.
pub fn dynamic_import(
    module_name: &str,
    file_path: impl AsRef<Path>,
    coordinates: &[&str],
) -> StubResult<(Vec<String>, LazyModule)> {
    dynamic_import_with(Environment::global()?, module_name, file_path, coordinates)
}

pub fn dynamic_import_with(
    environment: Arc<Environment>,
    module_name: &str,
    file_path: impl AsRef<Path>,
    coordinates: &[&str],
) -> StubResult<(Vec<String>, LazyModule)> {
    let coordinates = coordinates
        .iter()
        .map(|raw| Coordinate::parse(raw))
        .collect::<StubResult<Vec<_>>>()?;

    let stub_path = file_path.as_ref().with_extension("pyi");
    let exports = stubfile::read_exports(&stub_path)?;
    debug!(
        "Module {} exports {} names from {}",
        module_name,
        exports.len(),
        stub_path.display()
    );

    let module = LazyModule {
        environment,
        module_name: module_name.to_string(),
        stub_path,
        coordinates,
        exports: exports.clone(),
        namespace: OnceCell::new(),
        cache: Mutex::new(HashMap::new()),
        state: Mutex::new(ModuleState::Unbootstrapped),
    };
    Ok((exports, module))
}

fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

impl LazyModule {
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn stub_path(&self) -> &Path {
        &self.stub_path
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Names declared by the stub, sorted.
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    pub fn state(&self) -> ModuleState {
        *self.state.lock()
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.lock().contains_key(name)
    }

    fn advance(&self, next: ModuleState) {
        let mut state = self.state.lock();
        if next > *state {
            *state = next;
        }
    }

    fn namespace(&self) -> StubResult<&Arc<dyn NamespaceHandle>> {
        if let Some(namespace) = self.namespace.get() {
            return Ok(namespace);
        }

        // Bootstrap outside the cell so overlapping callers share one
        // attempt through the environment.
        self.advance(ModuleState::Bootstrapping);
        let session = self.environment.bootstrap(&self.coordinates)?;
        let namespace = self
            .namespace
            .get_or_try_init(|| session.load_namespace(&self.module_name))?;
        self.advance(ModuleState::Bootstrapped);
        Ok(namespace)
    }

    /// Look up `name` in the runtime namespace backing this module.
    ///
    /// The first successful lookup of a name is cached and every later
    /// lookup returns the same value. Misses are not cached.
    pub fn resolve(&self, name: &str) -> StubResult<Arc<RuntimeValue>> {
        if let Some(value) = self.cache.lock().get(name) {
            return Ok(value.clone());
        }

        // Interpreter lookups such as `__path__` must not start the runtime.
        if is_dunder(name) && !self.exports.iter().any(|e| e == name) {
            return Err(self.not_found(name));
        }

        let value = self
            .namespace()?
            .attribute(name)
            .ok_or_else(|| self.not_found(name))?;

        let mut cache = self.cache.lock();
        let cached = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(value))
            .clone();
        Ok(cached)
    }

    fn not_found(&self, name: &str) -> StubError {
        StubError::AttributeNotFound {
            module: self.module_name.clone(),
            name: name.to_string(),
        }
    }
}
