use crate::error::StubResult;
use crate::runtime::NamespaceHandle;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub include_javadoc: bool,
    /// Type `java.lang.String` as a native string in signatures.
    pub convert_strings: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            include_javadoc: true,
            convert_strings: true,
        }
    }
}

/// Emits draft stub files for already-loaded namespaces.
pub trait DeclarationGenerator: Send + Sync {
    /// Generate stubs for all namespaces in one pass so cross-namespace
    /// references resolve against the same set. Returns the written files.
    fn generate(
        &self,
        namespaces: &[Arc<dyn NamespaceHandle>],
        output_dir: &Path,
        options: &GeneratorOptions,
    ) -> StubResult<Vec<PathBuf>>;
}

/// Optional style pass over generated files.
pub trait Formatter: Send + Sync {
    fn name(&self) -> &str;

    /// Absence of the tool is not an error; the pass is skipped.
    fn is_available(&self) -> bool;

    fn format(&self, files: &[PathBuf]) -> StubResult<()>;
}
