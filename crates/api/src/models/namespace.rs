use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Sole declaration of a stub that describes a bare package.
pub const MODULE_MARKER: &str = "__module_protocol__";

/// A dotted Java package name under which stubs are generated.
///
/// The empty root stands for an archive whose classes live directly at its
/// top level, i.e. the whole archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceRoot(String);

impl NamespaceRoot {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Root for the top level of an archive.
    pub fn archive() -> Self {
        Self(String::new())
    }

    pub fn is_archive_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Relative directory of this namespace in a stub tree.
    pub fn to_relative_path(&self) -> PathBuf {
        self.segments().collect()
    }

    /// True if `other` is this namespace or lives below it.
    pub fn contains(&self, other: &str) -> bool {
        self.0.is_empty()
            || other == self.0
            || (other.starts_with(&self.0) && other[self.0.len()..].starts_with('.'))
    }
}

impl fmt::Display for NamespaceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<archive>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for NamespaceRoot {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NamespaceRoot {
    fn from(value: String) -> Self {
        Self(value)
    }
}
