use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options applied when the managed runtime is first started.
///
/// They cannot be changed once the runtime is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOptions {
    /// Convert `java.lang.String` return values to native strings.
    pub convert_strings: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            convert_strings: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

/// A class loaded from the runtime classpath.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JavaClass {
    /// Fully qualified dotted name, e.g. `org.example.util.Strings`.
    pub name: String,
    pub kind: JavaClassKind,
    /// Archive the class file was read from.
    pub archive: PathBuf,
}

impl JavaClass {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }
}

/// A value living in the running runtime, as handed out by a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeValue {
    Package(String),
    Class(JavaClass),
}

impl RuntimeValue {
    pub fn qualified_name(&self) -> &str {
        match self {
            RuntimeValue::Package(name) => name,
            RuntimeValue::Class(class) => &class.name,
        }
    }
}
