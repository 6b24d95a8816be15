//! Declaration generator working from class files.
//!
//! Writes one `__init__.pyi` per package below each requested namespace,
//! plus marker-only stubs for the ancestors of the requested namespaces so
//! the tree is importable from its top.

mod converter;
mod model;
mod render;

pub use converter::{Position, PyType, PyTypeConverter};
pub use model::{StubClass, StubField, StubMethod, java_identifier, python_identifier};
pub use render::{StubPackage, render_package};

use crate::classpath::parse_class;
use jstubs_api::{DeclarationGenerator, GeneratorOptions, NamespaceHandle, StubResult};
use ristretto_classfile::ClassFile;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const STUB_FILE_NAME: &str = "__init__.pyi";

#[derive(Debug, Default)]
pub struct ClassfileStubGenerator;

impl ClassfileStubGenerator {
    pub fn new() -> Self {
        Self
    }

    fn collect_packages(
        handle: Arc<dyn NamespaceHandle>,
        out: &mut BTreeMap<String, Arc<dyn NamespaceHandle>>,
    ) {
        if out.contains_key(handle.name()) {
            return;
        }
        let children: Vec<Arc<dyn NamespaceHandle>> = handle
            .members()
            .iter()
            .filter_map(|member| handle.subpackage(member))
            .collect();
        out.insert(handle.name().to_string(), handle);
        for child in children {
            Self::collect_packages(child, out);
        }
    }

    /// Proper ancestors of a dotted name, shallowest first.
    fn ancestors(name: &str) -> Vec<String> {
        let segments: Vec<&str> = name.split('.').filter(|s| !s.is_empty()).collect();
        (1..segments.len())
            .map(|depth| segments[..depth].join("."))
            .collect()
    }

    fn stub_path(output_dir: &Path, package: &str) -> PathBuf {
        let mut path = output_dir.to_path_buf();
        path.extend(
            package
                .split('.')
                .filter(|s| !s.is_empty())
                .map(model::python_segment),
        );
        path.push(STUB_FILE_NAME);
        path
    }
}

impl DeclarationGenerator for ClassfileStubGenerator {
    fn generate(
        &self,
        namespaces: &[Arc<dyn NamespaceHandle>],
        output_dir: &Path,
        options: &GeneratorOptions,
    ) -> StubResult<Vec<PathBuf>> {
        let mut packages: BTreeMap<String, Arc<dyn NamespaceHandle>> = BTreeMap::new();
        for namespace in namespaces {
            Self::collect_packages(namespace.clone(), &mut packages);
        }

        // Read every public class first so references across packages
        // resolve against the whole generated set.
        let mut parsed: BTreeMap<String, Vec<(String, ClassFile)>> = BTreeMap::new();
        let mut known_classes = BTreeSet::new();
        for (name, handle) in &packages {
            let mut classes = Vec::new();
            for class in handle.classes() {
                let bytes = handle.class_bytes(class.simple_name())?;
                let class_file = parse_class(&class.name, bytes)?;
                if model::is_stubbable_class(&class.name, &class_file) {
                    known_classes.insert(class.name.clone());
                    classes.push((class.name, class_file));
                }
            }
            parsed.insert(name.clone(), classes);
        }
        debug!(
            "Collected {} public classes in {} packages",
            known_classes.len(),
            packages.len()
        );

        let mut all_packages: BTreeSet<String> = packages.keys().cloned().collect();
        for namespace in namespaces {
            all_packages.extend(Self::ancestors(namespace.name()));
        }

        let converter = PyTypeConverter::new(&known_classes, options.convert_strings);
        let mut written = Vec::new();
        for package_name in &all_packages {
            let mut package = StubPackage {
                name: package_name.clone(),
                ..Default::default()
            };

            for (fqn, class_file) in parsed.get(package_name).into_iter().flatten() {
                package
                    .classes
                    .push(StubClass::from_classfile(fqn, class_file, &converter)?);
            }

            package.subpackages = all_packages
                .iter()
                .filter_map(|candidate| {
                    let rest = if package_name.is_empty() {
                        candidate.as_str()
                    } else {
                        candidate.strip_prefix(package_name.as_str())?.strip_prefix('.')?
                    };
                    (!rest.is_empty() && !rest.contains('.')).then(|| rest.to_string())
                })
                .collect();

            let path = Self::stub_path(output_dir, package_name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, render_package(&package, options.include_javadoc))?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        info!(
            "Generated {} stub files under {}",
            written.len(),
            output_dir.display()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestors() {
        assert_eq!(
            ClassfileStubGenerator::ancestors("org.example.util"),
            vec!["org".to_string(), "org.example".to_string()]
        );
        assert!(ClassfileStubGenerator::ancestors("org").is_empty());
        assert!(ClassfileStubGenerator::ancestors("").is_empty());
    }

    #[test]
    fn test_stub_path() {
        let out = Path::new("/tmp/stubs");
        assert_eq!(
            ClassfileStubGenerator::stub_path(out, "org.example"),
            PathBuf::from("/tmp/stubs/org/example/__init__.pyi")
        );
        assert_eq!(
            ClassfileStubGenerator::stub_path(out, ""),
            PathBuf::from("/tmp/stubs/__init__.pyi")
        );
    }
}
