//! Runtime bridge backed directly by the resolved classpath.
//!
//! Starting the runtime indexes every classpath entry (jar archives and
//! class directories) into a package tree. Namespaces and classes are then
//! served from that tree; class files are read on demand.

use crate::archive::is_class_entry;
use crate::stubgen::java_identifier;
use jstubs_api::{
    JavaClass, JavaClassKind, NamespaceHandle, RuntimeLauncher, RuntimeSession, RuntimeValue,
    StartOptions, StubError, StubResult,
};
use ristretto_classfile::{ClassAccessFlags, ClassFile};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Where a class file lives.
#[derive(Debug, Clone)]
enum ClassLocation {
    Archive { archive: usize, entry: String },
    File(PathBuf),
}

#[derive(Debug, Default)]
struct PackageEntry {
    classes: BTreeMap<String, ClassLocation>,
    subpackages: BTreeSet<String>,
}

/// Package tree of a classpath. The first classpath entry defining a class
/// wins, as with a regular class loader.
#[derive(Debug, Default)]
pub struct ClasspathIndex {
    archives: Vec<PathBuf>,
    packages: BTreeMap<String, PackageEntry>,
}

impl ClasspathIndex {
    pub fn build(classpath: &[PathBuf]) -> StubResult<Self> {
        let mut index = Self::default();
        for entry in classpath {
            if entry.is_dir() {
                index.add_directory(entry);
            } else {
                index.add_archive(entry)?;
            }
        }
        info!(
            "Indexed {} packages from {} classpath entries",
            index.packages.len(),
            classpath.len()
        );
        Ok(index)
    }

    fn add_archive(&mut self, path: &Path) -> StubResult<()> {
        let unreadable = |reason: String| StubError::ArchiveUnreadable {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
        let archive = ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;

        let archive_idx = self.archives.len();
        self.archives.push(path.to_path_buf());

        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let mut count = 0usize;
        for name in names {
            if self.add_class(
                &name,
                ClassLocation::Archive {
                    archive: archive_idx,
                    entry: name.clone(),
                },
            ) {
                count += 1;
            }
        }
        debug!("Indexed {} classes from {}", count, path.display());
        Ok(())
    }

    fn add_directory(&mut self, root: &Path) {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            self.add_class(&name, ClassLocation::File(entry.path().to_path_buf()));
        }
    }

    /// Register a class entry; returns false for entries that are not
    /// top-level public-candidate classes.
    fn add_class(&mut self, name: &str, location: ClassLocation) -> bool {
        if !is_class_entry(name) {
            return false;
        }
        let (package_path, file_name) = name.rsplit_once('/').unwrap_or(("", name));
        let simple = file_name.trim_end_matches(".class");
        // Nested classes and package descriptors are reached through their owners.
        if simple.contains('$') || simple == "package-info" {
            return false;
        }

        let package = package_path.replace('/', ".");
        self.register_package(&package);
        let entry = self.packages.entry(package).or_default();
        if entry.classes.contains_key(simple) {
            return false;
        }
        entry.classes.insert(simple.to_string(), location);
        true
    }

    fn register_package(&mut self, package: &str) {
        let mut current = package.to_string();
        loop {
            let parent = match current.rsplit_once('.') {
                Some((parent, _)) => parent.to_string(),
                None if current.is_empty() => {
                    self.packages.entry(current).or_default();
                    return;
                }
                None => String::new(),
            };
            let child = current.rsplit('.').next().unwrap_or(&current).to_string();
            let parent_entry = self.packages.entry(parent.clone()).or_default();
            let inserted = parent_entry.subpackages.insert(child);
            self.packages.entry(current).or_default();
            if !inserted {
                return;
            }
            current = parent;
        }
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn has_class(&self, fqn: &str) -> bool {
        let (package, simple) = fqn.rsplit_once('.').unwrap_or(("", fqn));
        self.packages
            .get(package)
            .is_some_and(|p| p.classes.contains_key(simple))
    }

    fn read_bytes(&self, location: &ClassLocation) -> StubResult<Vec<u8>> {
        match location {
            ClassLocation::File(path) => Ok(std::fs::read(path)?),
            ClassLocation::Archive { archive, entry } => {
                let path = &self.archives[*archive];
                let unreadable = |reason: String| StubError::ArchiveUnreadable {
                    path: path.clone(),
                    reason,
                };
                let file = File::open(path)?;
                let mut zip = ZipArchive::new(file).map_err(|e| unreadable(e.to_string()))?;
                let mut zip_entry = zip.by_name(entry).map_err(|e| unreadable(e.to_string()))?;
                let mut bytes = Vec::new();
                zip_entry.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }

    fn source_path(&self, location: &ClassLocation) -> PathBuf {
        match location {
            ClassLocation::File(path) => path.clone(),
            ClassLocation::Archive { archive, .. } => self.archives[*archive].clone(),
        }
    }

    fn describe_class(&self, package: &str, simple: &str, location: &ClassLocation) -> JavaClass {
        let name = if package.is_empty() {
            simple.to_string()
        } else {
            format!("{package}.{simple}")
        };
        let kind = match self.read_bytes(location).and_then(|bytes| parse_class(&name, bytes)) {
            Ok(class) => class_kind(class.access_flags),
            Err(e) => {
                warn!("Could not read class {}: {}", name, e);
                JavaClassKind::Class
            }
        };
        JavaClass {
            name,
            kind,
            archive: self.source_path(location),
        }
    }
}

/// Parse raw class file bytes.
pub fn parse_class(name: &str, bytes: Vec<u8>) -> StubResult<ClassFile> {
    ClassFile::from_bytes(&mut Cursor::new(bytes)).map_err(|e| StubError::NamespaceLoad {
        name: name.to_string(),
        reason: format!("Failed to parse class: {e:?}"),
    })
}

pub fn class_kind(flags: ClassAccessFlags) -> JavaClassKind {
    if flags.contains(ClassAccessFlags::ANNOTATION) {
        JavaClassKind::Annotation
    } else if flags.contains(ClassAccessFlags::INTERFACE) {
        JavaClassKind::Interface
    } else if flags.contains(ClassAccessFlags::ENUM) {
        JavaClassKind::Enum
    } else {
        JavaClassKind::Class
    }
}

/// Launches a [`ClasspathSession`].
#[derive(Debug, Default)]
pub struct ClasspathRuntime;

impl RuntimeLauncher for ClasspathRuntime {
    fn start(
        &self,
        classpath: Vec<PathBuf>,
        options: StartOptions,
    ) -> StubResult<Arc<dyn RuntimeSession>> {
        Ok(Arc::new(ClasspathSession::start(classpath, options)?))
    }
}

pub struct ClasspathSession {
    classpath: Vec<PathBuf>,
    options: StartOptions,
    index: Arc<ClasspathIndex>,
}

impl ClasspathSession {
    pub fn start(classpath: Vec<PathBuf>, options: StartOptions) -> StubResult<Self> {
        let index = ClasspathIndex::build(&classpath).map_err(|e| match e {
            StubError::ArchiveUnreadable { .. } => e,
            other => StubError::Bootstrap(other.to_string()),
        })?;
        Ok(Self {
            classpath,
            options,
            index: Arc::new(index),
        })
    }
}

impl RuntimeSession for ClasspathSession {
    fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    fn options(&self) -> StartOptions {
        self.options
    }

    fn load_namespace(&self, name: &str) -> StubResult<Arc<dyn NamespaceHandle>> {
        if self.index.has_package(name) {
            return Ok(Arc::new(PackageHandle {
                name: name.to_string(),
                index: self.index.clone(),
            }));
        }
        // Stub modules carry keyword-escaped segments (`lambda_`).
        let java_name = name.split('.').map(java_identifier).collect::<Vec<_>>().join(".");
        if java_name != name && self.index.has_package(&java_name) {
            return Ok(Arc::new(PackageHandle {
                name: java_name,
                index: self.index.clone(),
            }));
        }

        let reason = if self.index.has_class(name) {
            "is a class, not a package".to_string()
        } else {
            "not found on the classpath".to_string()
        };
        Err(StubError::NamespaceLoad {
            name: name.to_string(),
            reason,
        })
    }
}

/// A package of a [`ClasspathIndex`].
pub struct PackageHandle {
    name: String,
    index: Arc<ClasspathIndex>,
}

impl PackageHandle {
    fn entry(&self) -> Option<&PackageEntry> {
        self.index.packages.get(&self.name)
    }

    fn child_name(&self, member: &str) -> String {
        if self.name.is_empty() {
            member.to_string()
        } else {
            format!("{}.{}", self.name, member)
        }
    }
}

impl NamespaceHandle for PackageHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<RuntimeValue> {
        let entry = self.entry()?;
        let name = if entry.classes.contains_key(name) || entry.subpackages.contains(name) {
            name
        } else {
            java_identifier(name)
        };
        if let Some(location) = entry.classes.get(name) {
            return Some(RuntimeValue::Class(
                self.index.describe_class(&self.name, name, location),
            ));
        }
        if entry.subpackages.contains(name) {
            return Some(RuntimeValue::Package(self.child_name(name)));
        }
        None
    }

    fn members(&self) -> Vec<String> {
        let Some(entry) = self.entry() else {
            return Vec::new();
        };
        let mut members: Vec<String> = entry
            .classes
            .keys()
            .chain(entry.subpackages.iter())
            .cloned()
            .collect();
        members.sort();
        members.dedup();
        members
    }

    fn classes(&self) -> Vec<JavaClass> {
        let Some(entry) = self.entry() else {
            return Vec::new();
        };
        entry
            .classes
            .iter()
            .map(|(simple, location)| self.index.describe_class(&self.name, simple, location))
            .collect()
    }

    fn subpackage(&self, name: &str) -> Option<Arc<dyn NamespaceHandle>> {
        let entry = self.entry()?;
        if !entry.subpackages.contains(name) {
            return None;
        }
        Some(Arc::new(PackageHandle {
            name: self.child_name(name),
            index: self.index.clone(),
        }))
    }

    fn class_bytes(&self, simple_name: &str) -> StubResult<Vec<u8>> {
        let location = self
            .entry()
            .and_then(|e| e.classes.get(simple_name))
            .ok_or_else(|| StubError::AttributeNotFound {
                module: self.name.clone(),
                name: simple_name.to_string(),
            })?;
        self.index.read_bytes(location)
    }
}
