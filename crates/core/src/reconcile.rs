//! Post-processing of a freshly generated stub tree.
//!
//! Each `.pyi` is classified as namespace-only (it declares nothing but the
//! namespace marker) or real. Namespace-only stubs may be deleted so the
//! directory becomes an implicit namespace package that several stub trees
//! can share; real stubs may receive a runtime shim next to them. Stub
//! contents are never edited.

use crate::shim::{self, DEFAULT_RUNTIME_PACKAGE};
use crate::stubfile;
use jstubs_api::{Coordinate, MODULE_MARKER, StubError, StubResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubKind {
    NamespaceOnly,
    Real,
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub remove_namespace_only: bool,
    pub add_runtime_imports: bool,
    /// Coordinates written into every shim.
    pub coordinates: Vec<Coordinate>,
    /// Python package the shims import `dynamic_import` from.
    pub runtime_package: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            remove_namespace_only: false,
            add_runtime_imports: true,
            coordinates: Vec::new(),
            runtime_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub real: Vec<PathBuf>,
    pub namespace_only: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    /// Shims created or rewritten in this pass.
    pub shims_written: Vec<PathBuf>,
}

/// Classify stub source text.
pub fn classify_source(source: &str) -> Result<StubKind, String> {
    let names = stubfile::module_scope_names(source)?;
    if names.len() == 1 && names.contains(MODULE_MARKER) {
        Ok(StubKind::NamespaceOnly)
    } else {
        Ok(StubKind::Real)
    }
}

pub fn classify(path: &Path) -> StubResult<StubKind> {
    let source = std::fs::read_to_string(path)?;
    classify_source(&source).map_err(|reason| StubError::StubParse {
        path: path.to_path_buf(),
        reason,
    })
}

pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// All stub files below `output_dir`, in a stable order.
    fn stub_files(output_dir: &Path) -> StubResult<Vec<PathBuf>> {
        let mut stubs = Vec::new();
        for entry in WalkDir::new(output_dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("pyi")
            {
                stubs.push(entry.into_path());
            }
        }
        Ok(stubs)
    }

    pub fn run(&self, output_dir: &Path) -> StubResult<ReconcileReport> {
        if self.options.add_runtime_imports {
            info!("Adding runtime imports to generated stubs");
        }

        // Classify everything before touching the tree.
        let mut classified = Vec::new();
        for stub in Self::stub_files(output_dir)? {
            let kind = classify(&stub)?;
            classified.push((stub, kind));
        }

        let shim_text =
            shim::render_shim(&self.options.runtime_package, &self.options.coordinates);
        let mut report = ReconcileReport::default();
        for (stub, kind) in classified {
            match kind {
                StubKind::NamespaceOnly => {
                    if self.options.remove_namespace_only {
                        info!("Removing namespace only stub {}", stub.display());
                        std::fs::remove_file(&stub)?;
                        report.removed.push(stub.clone());
                    }
                    report.namespace_only.push(stub);
                }
                StubKind::Real => {
                    if self.options.add_runtime_imports {
                        let target = shim::shim_path(&stub);
                        let current = std::fs::read_to_string(&target).ok();
                        if current.as_deref() != Some(shim_text.as_str()) {
                            debug!(
                                "Writing runtime shim for {}",
                                shim::module_name(output_dir, &stub)
                            );
                            std::fs::write(&target, &shim_text)?;
                            report.shims_written.push(target);
                        }
                    }
                    report.real.push(stub);
                }
            }
        }

        info!(
            "Reconciled {} stubs: {} real, {} namespace-only, {} removed, {} shims written",
            report.real.len() + report.namespace_only.len(),
            report.real.len(),
            report.namespace_only.len(),
            report.removed.len(),
            report.shims_written.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER_ONLY: &str = "import typing\n\nclass __module_protocol__(typing.Protocol):\n    ...\n";
    const REAL: &str = "import typing\n\nclass Strings:\n    ...\n\nclass __module_protocol__(typing.Protocol):\n    Strings: typing.Type[Strings]\n";

    #[test]
    fn test_classify_source() {
        assert_eq!(classify_source(MARKER_ONLY).unwrap(), StubKind::NamespaceOnly);
        assert_eq!(classify_source(REAL).unwrap(), StubKind::Real);
        // No marker and no declarations is not a namespace stub either.
        assert_eq!(classify_source("import typing\n").unwrap(), StubKind::Real);
    }

    #[test]
    fn test_namespace_only_kept_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("org/__init__.pyi");
        std::fs::create_dir_all(stub.parent().unwrap()).unwrap();
        std::fs::write(&stub, MARKER_ONLY).unwrap();

        let report = Reconciler::new(ReconcileOptions::default())
            .run(dir.path())
            .unwrap();
        assert!(stub.exists());
        assert_eq!(report.namespace_only, vec![stub.clone()]);
        assert!(report.removed.is_empty());
        assert!(!shim::shim_path(&stub).exists());
    }

    /// Every file below `root` with its contents.
    fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let text = std::fs::read_to_string(e.path()).unwrap();
                (e.into_path(), text)
            })
            .collect()
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let org = dir.path().join("org/__init__.pyi");
        let util = dir.path().join("org/example/util/__init__.pyi");
        std::fs::create_dir_all(util.parent().unwrap()).unwrap();
        std::fs::write(&org, MARKER_ONLY).unwrap();
        std::fs::write(&util, REAL).unwrap();

        let reconciler = Reconciler::new(ReconcileOptions {
            remove_namespace_only: true,
            add_runtime_imports: true,
            coordinates: vec!["org.example:lib:1.0.0".parse().unwrap()],
            ..Default::default()
        });

        let first = reconciler.run(dir.path()).unwrap();
        assert_eq!(first.removed, vec![org.clone()]);
        assert_eq!(first.shims_written, vec![shim::shim_path(&util)]);
        let after_first = snapshot(dir.path());

        let second = reconciler.run(dir.path()).unwrap();
        assert!(second.removed.is_empty());
        assert!(second.namespace_only.is_empty());
        assert!(second.shims_written.is_empty());
        assert_eq!(second.real, vec![util]);
        assert_eq!(snapshot(dir.path()), after_first);
    }

    #[test]
    fn test_classify_reads_files_like_source() {
        let dir = tempfile::tempdir().unwrap();
        let stub = dir.path().join("marker.pyi");
        std::fs::write(&stub, MARKER_ONLY).unwrap();
        assert_eq!(classify(&stub).unwrap(), StubKind::NamespaceOnly);

        std::fs::write(&stub, "def (:\n").unwrap();
        match classify(&stub) {
            Err(StubError::StubParse { path, .. }) => assert_eq!(path, stub),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_stub_aborts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pyi"), "def (:\n").unwrap();

        let err = Reconciler::new(ReconcileOptions::default())
            .run(dir.path())
            .unwrap_err();
        assert!(matches!(err, jstubs_api::StubError::StubParse { .. }));
    }
}
