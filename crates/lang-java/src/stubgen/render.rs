use super::model::{StubClass, StubMethod, python_module, python_segment};
use jstubs_api::{JavaClassKind, MODULE_MARKER};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Everything needed to write one package's `__init__.pyi`.
#[derive(Debug, Default)]
pub struct StubPackage {
    pub name: String,
    pub classes: Vec<StubClass>,
    /// Direct sub-packages that are part of the generated tree.
    pub subpackages: Vec<String>,
}

impl StubPackage {
    fn child(&self, member: &str) -> String {
        if self.name.is_empty() {
            member.to_string()
        } else {
            format!("{}.{}", self.name, member)
        }
    }
}

pub fn render_package(package: &StubPackage, include_javadoc: bool) -> String {
    let mut imports = BTreeSet::new();
    for class in &package.classes {
        for field in &class.fields {
            field.ty.referenced_packages(&package.name, &mut imports);
        }
        for method in &class.methods {
            method.return_type.referenced_packages(&package.name, &mut imports);
            for param in &method.parameters {
                param.referenced_packages(&package.name, &mut imports);
            }
        }
    }
    for sub in &package.subpackages {
        imports.insert(python_module(&package.child(sub)));
    }

    let mut out = String::new();
    out.push_str("from __future__ import annotations\n\n");
    out.push_str("import typing\n");
    for import in &imports {
        let _ = writeln!(out, "import {import}");
    }

    for class in &package.classes {
        out.push_str("\n\n");
        render_class(&mut out, class, &package.name, include_javadoc);
    }

    out.push_str("\n\n");
    let _ = writeln!(out, "class {MODULE_MARKER}(typing.Protocol):");
    let label = if package.name.is_empty() {
        "the classpath root".to_string()
    } else {
        format!("package '{}'", package.name)
    };
    let _ = writeln!(out, "    # Members of {label} as seen through the runtime bridge.");
    if package.classes.is_empty() && package.subpackages.is_empty() {
        out.push_str("    ...\n");
    }
    for class in &package.classes {
        let _ = writeln!(out, "    {}: typing.Type[{}]", class.name, class.name);
    }
    for sub in &package.subpackages {
        let _ = writeln!(
            out,
            "    {}: {}.{MODULE_MARKER}",
            python_segment(sub),
            python_module(&package.child(sub))
        );
    }
    out
}

fn render_class(out: &mut String, class: &StubClass, package: &str, include_javadoc: bool) {
    let _ = writeln!(out, "class {}:", class.name);
    let mut empty = true;

    if include_javadoc {
        let kind = match class.kind {
            JavaClassKind::Class => "class",
            JavaClassKind::Interface => "interface",
            JavaClassKind::Enum => "enum",
            JavaClassKind::Annotation => "annotation",
        };
        let _ = writeln!(out, "    \"\"\"Java {kind} '{}'.\"\"\"", class.fqn);
        empty = false;
    }

    for field in &class.fields {
        let ty = field.ty.render(package);
        if field.is_static {
            let _ = writeln!(out, "    {}: typing.ClassVar[{}]", field.name, ty);
        } else {
            let _ = writeln!(out, "    {}: {}", field.name, ty);
        }
        empty = false;
    }

    let mut overloads: BTreeMap<&str, Vec<&StubMethod>> = BTreeMap::new();
    let mut order: Vec<&str> = Vec::new();
    for method in &class.methods {
        let group = overloads.entry(method.name.as_str()).or_default();
        if group.is_empty() {
            order.push(method.name.as_str());
        }
        group.push(method);
    }

    for name in order {
        let group = &overloads[name];
        for method in group {
            if group.len() > 1 {
                out.push_str("    @typing.overload\n");
            }
            render_method(out, method, package);
            empty = false;
        }
    }

    if empty {
        out.push_str("    ...\n");
    }
}

fn render_method(out: &mut String, method: &StubMethod, package: &str) {
    let mut params: Vec<String> = Vec::new();
    if method.is_static {
        out.push_str("    @staticmethod\n");
    } else {
        params.push("self".to_string());
    }

    let last = method.parameters.len().saturating_sub(1);
    for (i, ty) in method.parameters.iter().enumerate() {
        let rendered = ty.render(package);
        if method.is_varargs && i == last {
            // Varargs arrive as a trailing array; also accept them spread out.
            params.push(format!("*arg{i}: typing.Any"));
        } else {
            params.push(format!("arg{i}: {rendered}"));
        }
    }

    let ret = if method.is_constructor() {
        "None".to_string()
    } else {
        method.return_type.render(package)
    };
    let _ = writeln!(
        out,
        "    def {}({}) -> {}: ...",
        method.name,
        params.join(", "),
        ret
    );
}
