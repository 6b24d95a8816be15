use jstubs_api::{
    DeclarationGenerator, GeneratorOptions, NamespaceHandle, NamespaceRoot, RuntimeSession,
    StubError, StubResult,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Loads namespace roots from a running session and hands them to the
/// declaration generator in a single pass.
pub struct StubDriver<'a> {
    generator: &'a dyn DeclarationGenerator,
}

impl<'a> StubDriver<'a> {
    pub fn new(generator: &'a dyn DeclarationGenerator) -> Self {
        Self { generator }
    }

    /// Load every root, failing on the first one that cannot be loaded.
    /// The empty root loads the whole classpath top level.
    pub fn load_roots(
        session: &dyn RuntimeSession,
        roots: &BTreeSet<NamespaceRoot>,
    ) -> StubResult<Vec<Arc<dyn NamespaceHandle>>> {
        roots
            .iter()
            .map(|root| {
                debug!("Loading namespace {}", root);
                session.load_namespace(root.as_str())
            })
            .collect()
    }

    pub fn generate(
        &self,
        session: &dyn RuntimeSession,
        roots: &BTreeSet<NamespaceRoot>,
        output_dir: &Path,
        include_javadoc: bool,
    ) -> StubResult<Vec<PathBuf>> {
        if roots.is_empty() {
            return Err(StubError::NamespaceLoad {
                name: String::new(),
                reason: "no namespace roots to generate stubs for".to_string(),
            });
        }

        let namespaces = Self::load_roots(session, roots)?;
        let options = GeneratorOptions {
            include_javadoc,
            convert_strings: session.options().convert_strings,
        };

        let names: Vec<String> = roots.iter().map(ToString::to_string).collect();
        info!("Generating stubs for: {:?}", names);
        info!("Writing stubs to: {}", output_dir.display());
        std::fs::create_dir_all(output_dir)?;
        self.generator.generate(&namespaces, output_dir, &options)
    }
}
