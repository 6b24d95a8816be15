//! Runtime shim modules placed next to real stubs.

use jstubs_api::Coordinate;
use std::path::{Path, PathBuf};

/// Python package the shims import `dynamic_import` from.
///
/// This workspace does not ship that package. Whatever is installed under
/// this name (or `StubgenConfig::runtime_package`) must export
///
/// ```python
/// def dynamic_import(
///     module_name: str, file: str, coordinates: list[str]
/// ) -> tuple[list[str], Callable[[str], Any]]: ...
/// ```
///
/// returning the module's `__all__` and a module-level `__getattr__`. A
/// binding over [`crate::dynamic::dynamic_import`] provides exactly that.
/// The names in `__all__` are the stub's module-scope declarations, and
/// `__getattr__` resolves them against the live runtime on first access.
pub const DEFAULT_RUNTIME_PACKAGE: &str = "jstubs";

/// Render a Python string literal.
pub fn py_str(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

pub fn render_shim(runtime_package: &str, coordinates: &[Coordinate]) -> String {
    let endpoints: Vec<String> = coordinates.iter().map(|c| py_str(c.as_str())).collect();
    format!(
        "from {runtime_package} import dynamic_import\n\
         \n\
         __all__, __getattr__ = dynamic_import(__name__, __file__, [{}])\n",
        endpoints.join(", ")
    )
}

/// The loadable module that accompanies a stub file.
pub fn shim_path(stub: &Path) -> PathBuf {
    stub.with_extension("py")
}

/// Dotted module name of a stub relative to the root of its tree.
/// Package stubs (`__init__.pyi`) are named after their directory.
pub fn module_name(output_dir: &Path, stub: &Path) -> String {
    let relative = stub.strip_prefix(output_dir).unwrap_or(stub);
    let mut parts: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    if let Some(stem) = relative.file_stem().and_then(|s| s.to_str()) {
        if stem != "__init__" {
            parts.push(stem.to_string());
        }
    }
    parts.join(".")
}
