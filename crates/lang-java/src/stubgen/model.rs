use super::converter::{Position, PyType, PyTypeConverter};
use jstubs_api::{JavaClassKind, StubError, StubResult};
use ristretto_classfile::{ClassAccessFlags, ClassFile, FieldAccessFlags, MethodAccessFlags};
use tracing::debug;

/// Public surface of one class, ready to render.
#[derive(Debug, Clone)]
pub struct StubClass {
    pub name: String,
    pub fqn: String,
    pub kind: JavaClassKind,
    pub fields: Vec<StubField>,
    pub methods: Vec<StubMethod>,
}

#[derive(Debug, Clone)]
pub struct StubField {
    pub name: String,
    pub ty: PyType,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct StubMethod {
    /// Python-side name; constructors are `__init__`.
    pub name: String,
    pub parameters: Vec<PyType>,
    pub return_type: PyType,
    pub is_static: bool,
    pub is_varargs: bool,
}

impl StubMethod {
    pub fn is_constructor(&self) -> bool {
        self.name == "__init__"
    }
}

/// Whether a class can be stubbed: public, not synthetic, and spelled as a
/// Python identifier.
pub fn is_stubbable_class(fqn: &str, class: &ClassFile) -> bool {
    let simple = fqn.rsplit('.').next().unwrap_or(fqn);
    is_public_class(class) && python_identifier(simple).is_some()
}

pub fn is_public_class(class: &ClassFile) -> bool {
    class.access_flags.contains(ClassAccessFlags::PUBLIC)
        && !class.access_flags.contains(ClassAccessFlags::SYNTHETIC)
}

impl StubClass {
    pub fn from_classfile(
        fqn: &str,
        class: &ClassFile,
        converter: &PyTypeConverter<'_>,
    ) -> StubResult<Self> {
        let parse_err = |e: ristretto_classfile::Error| StubError::Generator(format!("{fqn}: {e:?}"));

        let mut methods = Vec::new();
        for method in &class.methods {
            let flags = method.access_flags;
            if !flags.contains(MethodAccessFlags::PUBLIC)
                || flags.intersects(MethodAccessFlags::SYNTHETIC | MethodAccessFlags::BRIDGE)
            {
                continue;
            }
            let java_name: &str = class
                .constant_pool
                .try_get_utf8(method.name_index)
                .map_err(parse_err)?;
            if java_name == "<clinit>" {
                continue;
            }
            let descriptor: &str = class
                .constant_pool
                .try_get_utf8(method.descriptor_index)
                .map_err(parse_err)?;
            let (parameters, return_type) =
                converter.convert_method(descriptor).map_err(parse_err)?;

            let is_constructor = java_name == "<init>";
            let name = if is_constructor {
                "__init__".to_string()
            } else {
                match python_identifier(java_name) {
                    Some(name) => name,
                    None => {
                        debug!("Skipping method {fqn}.{java_name}: not a Python identifier");
                        continue;
                    }
                }
            };
            methods.push(StubMethod {
                name,
                parameters,
                return_type: if is_constructor {
                    PyType::NoneType
                } else {
                    return_type
                },
                is_static: flags.contains(MethodAccessFlags::STATIC),
                is_varargs: flags.contains(MethodAccessFlags::VARARGS),
            });
        }

        let mut fields = Vec::new();
        for field in &class.fields {
            let flags = field.access_flags;
            if !flags.contains(FieldAccessFlags::PUBLIC) || flags.contains(FieldAccessFlags::SYNTHETIC)
            {
                continue;
            }
            let java_name: &str = class
                .constant_pool
                .try_get_utf8(field.name_index)
                .map_err(parse_err)?;
            let Some(name) = python_identifier(java_name) else {
                debug!("Skipping field {fqn}.{java_name}: not a Python identifier");
                continue;
            };
            // Methods shadow fields of the same name on the Python side.
            if methods.iter().any(|m| m.name == name) {
                continue;
            }
            fields.push(StubField {
                name,
                ty: converter.convert(&field.field_type, Position::Field),
                is_static: flags.contains(FieldAccessFlags::STATIC),
            });
        }

        let simple = fqn.rsplit('.').next().unwrap_or(fqn);
        let name = python_identifier(simple).ok_or_else(|| {
            StubError::Generator(format!("{fqn}: class name is not a Python identifier"))
        })?;
        Ok(Self {
            name,
            fqn: fqn.to_string(),
            kind: crate::classpath::class_kind(class.access_flags),
            fields,
            methods,
        })
    }
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

/// Python name of a Java member. Names that collide with Python keywords
/// get a trailing underscore, the way the bridge exposes them. JVM names
/// Python cannot spell (`MODULE$`, `$plus`) have no Python name.
pub fn python_identifier(name: &str) -> Option<String> {
    if PYTHON_KEYWORDS.contains(&name) {
        Some(format!("{name}_"))
    } else if is_identifier(name) {
        Some(name.to_string())
    } else {
        None
    }
}

/// Python module segment for one Java package segment. Unlike members,
/// packages cannot be dropped, so unusable characters are replaced.
pub fn python_segment(segment: &str) -> String {
    if let Some(name) = python_identifier(segment) {
        return name;
    }
    let mut out: String = segment
        .chars()
        .map(|c| if c == '_' || c.is_alphanumeric() { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c == '_' || c.is_alphabetic()) {
        out.insert(0, '_');
    }
    out
}

/// Java name behind a keyword-escaped Python name (`from_` to `from`).
pub fn java_identifier(name: &str) -> &str {
    match name.strip_suffix('_') {
        Some(stem) if PYTHON_KEYWORDS.contains(&stem) => stem,
        _ => name,
    }
}

/// Python module path of a dotted Java package name.
pub fn python_module(package: &str) -> String {
    package
        .split('.')
        .filter(|s| !s.is_empty())
        .map(python_segment)
        .collect::<Vec<_>>()
        .join(".")
}
