//! Namespace root discovery for compiled-class archives.
//!
//! A root is the shallowest package directory holding class files; roots of
//! one archive never nest, and together they cover every class entry.

use jstubs_api::{NamespaceRoot, StubError, StubResult};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// True for entries that denote a compiled type living in a package.
///
/// Module descriptors and multi-release copies under `META-INF/` are class
/// files too, but they are not types of any package.
pub fn is_class_entry(name: &str) -> bool {
    if !name.ends_with(".class") || name.starts_with("META-INF/") {
        return false;
    }
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name != "module-info.class"
}

/// Compute the minimal covering roots for a list of archive entry paths.
pub fn namespace_roots<'a, I>(entries: I) -> BTreeSet<NamespaceRoot>
where
    I: IntoIterator<Item = &'a str>,
{
    let class_dirs: BTreeSet<Vec<&str>> = entries
        .into_iter()
        .filter(|name| is_class_entry(name))
        .map(|name| {
            let mut parts: Vec<&str> = name.split('/').filter(|p| !p.is_empty()).collect();
            parts.pop();
            parts
        })
        .collect();

    let mut sorted: Vec<Vec<&str>> = class_dirs.into_iter().collect();
    sorted.sort_by_key(|dir| dir.len());

    let mut accepted: Vec<Vec<&str>> = Vec::new();
    for dir in sorted {
        if !accepted.iter().any(|root| dir.starts_with(root)) {
            accepted.push(dir);
        }
    }

    accepted
        .into_iter()
        .map(|parts| NamespaceRoot::new(parts.join(".")))
        .collect()
}

/// Inspect an archive on disk and return its namespace roots.
///
/// An archive that cannot be opened or parsed is an error, never an empty
/// root set.
pub fn list_top_level_packages(archive_path: &Path) -> StubResult<BTreeSet<NamespaceRoot>> {
    let unreadable = |reason: String| StubError::ArchiveUnreadable {
        path: archive_path.to_path_buf(),
        reason,
    };

    let file = File::open(archive_path).map_err(|e| unreadable(e.to_string()))?;
    let archive = ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;

    let roots = namespace_roots(archive.file_names());
    debug!(
        "Found {} namespace roots in {}",
        roots.len(),
        archive_path.display()
    );
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn roots(entries: &[&str]) -> Vec<String> {
        namespace_roots(entries.iter().copied())
            .into_iter()
            .map(|r| r.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_minimal_roots() {
        let found = roots(&[
            "a/b/C.class",
            "a/b/d/E.class",
            "a/f/G.class",
            "a/README.txt",
        ]);
        assert_eq!(found, vec!["a.b", "a.f"]);
    }

    #[test]
    fn test_top_level_classes_yield_archive_root() {
        let found = namespace_roots(["Main.class", "Helper.class"]);
        assert_eq!(found.len(), 1);
        assert!(found.iter().next().unwrap().is_archive_root());
    }

    #[test]
    fn test_top_level_class_covers_everything() {
        let found = roots(&["Main.class", "org/example/Util.class"]);
        assert_eq!(found, vec![""]);
    }

    #[test]
    fn test_ancestry_is_component_wise() {
        let found = roots(&["a/b/X.class", "a/bc/Y.class"]);
        assert_eq!(found, vec!["a.b", "a.bc"]);
    }

    #[test]
    fn test_ignores_descriptors_and_directories() {
        let found = roots(&[
            "module-info.class",
            "META-INF/versions/11/org/example/Util.class",
            "META-INF/MANIFEST.MF",
            "org/",
            "org/example/",
            "org/example/Util.class",
        ]);
        assert_eq!(found, vec!["org.example"]);
    }

    #[test]
    fn test_no_classes_no_roots() {
        assert!(roots(&["META-INF/MANIFEST.MF", "config.properties"]).is_empty());
    }

    #[test]
    fn test_list_top_level_packages_reads_jar() {
        let dir = tempdir().unwrap();
        let jar_path = dir.path().join("lib-1.0.0.jar");
        let file = File::create(&jar_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for name in ["org/example/util/Strings.class", "org/example/io/Files.class"] {
            zip.start_file(name, options).unwrap();
            zip.write_all(&[0xCA, 0xFE, 0xBA, 0xBE]).unwrap();
        }
        zip.finish().unwrap();

        let found: Vec<String> = list_top_level_packages(&jar_path)
            .unwrap()
            .into_iter()
            .map(|r| r.as_str().to_string())
            .collect();
        assert_eq!(found, vec!["org.example.io", "org.example.util"]);
    }

    #[test]
    fn test_malformed_archive_fails_loudly() {
        let dir = tempdir().unwrap();
        let jar_path = dir.path().join("broken.jar");
        std::fs::write(&jar_path, b"definitely not a zip file").unwrap();

        let err = list_top_level_packages(&jar_path).unwrap_err();
        assert!(matches!(err, StubError::ArchiveUnreadable { .. }));
    }
}
