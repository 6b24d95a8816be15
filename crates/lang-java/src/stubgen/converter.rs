use super::model::{python_identifier, python_module};
use ristretto_classfile::{BaseType, FieldType};
use std::collections::BTreeSet;

/// A Python annotation for a Java type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyType {
    Int,
    Float,
    Bool,
    Str,
    NoneType,
    Any,
    /// A generated class, by fully qualified dotted name.
    Class(String),
    Sequence(Box<PyType>),
}

/// Where a type appears; strings are only narrowed for return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Parameter,
    Return,
    Field,
}

/// Maps class file descriptors onto Python annotations.
///
/// Object types resolve to generated classes when they are part of the
/// stubbed set, and to `typing.Any` otherwise.
pub struct PyTypeConverter<'a> {
    known_classes: &'a BTreeSet<String>,
    convert_strings: bool,
}

impl<'a> PyTypeConverter<'a> {
    pub fn new(known_classes: &'a BTreeSet<String>, convert_strings: bool) -> Self {
        Self {
            known_classes,
            convert_strings,
        }
    }

    pub fn convert_method(
        &self,
        descriptor: &str,
    ) -> Result<(Vec<PyType>, PyType), ristretto_classfile::Error> {
        let (params, ret) = FieldType::parse_method_descriptor(descriptor)?;
        let parameters = params
            .iter()
            .map(|ty| self.convert(ty, Position::Parameter))
            .collect();
        let return_type = match ret {
            None => PyType::NoneType,
            Some(field_type) => self.convert(&field_type, Position::Return),
        };
        Ok((parameters, return_type))
    }

    pub fn convert(&self, ty: &FieldType, position: Position) -> PyType {
        match ty {
            FieldType::Base(BaseType::Byte)
            | FieldType::Base(BaseType::Int)
            | FieldType::Base(BaseType::Long)
            | FieldType::Base(BaseType::Short) => PyType::Int,
            FieldType::Base(BaseType::Double) | FieldType::Base(BaseType::Float) => PyType::Float,
            FieldType::Base(BaseType::Boolean) => PyType::Bool,
            FieldType::Base(BaseType::Char) => PyType::Str,
            FieldType::Object(name) => self.convert_object(&name.replace('/', "."), position),
            FieldType::Array(component) => {
                PyType::Sequence(Box::new(self.convert(component, position)))
            }
        }
    }

    fn convert_object(&self, fqn: &str, position: Position) -> PyType {
        if fqn == "java.lang.String" {
            // Strings are always accepted as arguments; what comes back
            // depends on the runtime's conversion policy.
            if position == Position::Parameter || self.convert_strings {
                return PyType::Str;
            }
        }
        // Nested classes are not stubbed on their own.
        if !fqn.contains('$') && self.known_classes.contains(fqn) {
            return PyType::Class(fqn.to_string());
        }
        PyType::Any
    }
}

impl PyType {
    /// Render relative to the package being written; classes of that
    /// package are referenced by simple name.
    pub fn render(&self, current_package: &str) -> String {
        match self {
            PyType::Int => "int".to_string(),
            PyType::Float => "float".to_string(),
            PyType::Bool => "bool".to_string(),
            PyType::Str => "str".to_string(),
            PyType::NoneType => "None".to_string(),
            PyType::Any => "typing.Any".to_string(),
            PyType::Class(fqn) => {
                let (package, simple) = fqn.rsplit_once('.').unwrap_or(("", fqn));
                let simple = python_identifier(simple).unwrap_or_else(|| simple.to_string());
                if package == current_package {
                    simple
                } else {
                    format!("{}.{simple}", python_module(package))
                }
            }
            PyType::Sequence(inner) => format!("typing.Sequence[{}]", inner.render(current_package)),
        }
    }

    /// Collect packages that must be imported for this annotation.
    pub fn referenced_packages(&self, current_package: &str, out: &mut BTreeSet<String>) {
        match self {
            PyType::Class(fqn) => {
                let package = fqn.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
                if package != current_package && !package.is_empty() {
                    out.insert(python_module(package));
                }
            }
            PyType::Sequence(inner) => inner.referenced_packages(current_package, out),
            _ => {}
        }
    }
}
