//! Static inspection of generated `.pyi` files.

use jstubs_api::{MODULE_MARKER, StubError, StubResult};
use std::collections::BTreeSet;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Names a stub introduces at module scope: class and function
/// definitions (decorated or not) and annotated assignments. Imports and
/// plain assignments do not declare exports.
pub fn module_scope_names(source: &str) -> Result<BTreeSet<String>, String> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    parser.set_language(&language).map_err(|e| e.to_string())?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| "parser produced no tree".to_string())?;
    let root = tree.root_node();
    if root.has_error() {
        let position = first_error(root)
            .map(|n| n.start_position())
            .unwrap_or_else(|| root.start_position());
        return Err(format!(
            "syntax error at line {}, column {}",
            position.row + 1,
            position.column + 1
        ));
    }

    let bytes = source.as_bytes();
    let mut names = BTreeSet::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        let declared = match child.kind() {
            "class_definition" | "function_definition" => child.child_by_field_name("name"),
            "decorated_definition" => child
                .child_by_field_name("definition")
                .and_then(|def| def.child_by_field_name("name")),
            "expression_statement" => child
                .named_child(0)
                .filter(|expr| {
                    expr.kind() == "assignment" && expr.child_by_field_name("type").is_some()
                })
                .and_then(|assignment| assignment.child_by_field_name("left"))
                .filter(|left| left.kind() == "identifier"),
            _ => None,
        };
        if let Some(node) = declared {
            if let Ok(text) = node.utf8_text(bytes) {
                names.insert(text.to_string());
            }
        }
    }
    Ok(names)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

/// Read and inspect a stub file.
pub fn read_module_names(path: &Path) -> StubResult<BTreeSet<String>> {
    let source = std::fs::read_to_string(path)?;
    module_scope_names(&source).map_err(|reason| StubError::StubParse {
        path: path.to_path_buf(),
        reason,
    })
}

/// The declared export list of a stub: every module-scope name except the
/// namespace marker, sorted.
pub fn read_exports(path: &Path) -> StubResult<Vec<String>> {
    Ok(read_module_names(path)?
        .into_iter()
        .filter(|name| name != MODULE_MARKER)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_module_scope_declarations() {
        let source = r#"
from __future__ import annotations

import typing
import org.example.io

VERSION: str
_cache = {}

class Strings:
    def inner(self) -> None: ...

@typing.overload
def helper(x: int) -> int: ...

def other() -> None: ...

class __module_protocol__(typing.Protocol):
    Strings: typing.Type[Strings]
"#;
        let names: Vec<String> = module_scope_names(source).unwrap().into_iter().collect();
        assert_eq!(
            names,
            vec!["Strings", "VERSION", "__module_protocol__", "helper", "other"]
        );
    }

    #[test]
    fn test_marker_only_stub() {
        let source = "import typing\nimport org.example\n\nclass __module_protocol__(typing.Protocol):\n    example: org.example.__module_protocol__\n";
        let names = module_scope_names(source).unwrap();
        assert_eq!(names.len(), 1);
        assert!(names.contains(MODULE_MARKER));
    }

    #[test]
    fn test_syntax_errors_are_reported() {
        let err = module_scope_names("class Broken(:\n    pass\n").unwrap_err();
        assert!(err.contains("syntax error"));
    }

    #[test]
    fn test_exports_exclude_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("__init__.pyi");
        std::fs::write(
            &path,
            "import typing\n\nclass B: ...\nclass A: ...\nclass __module_protocol__(typing.Protocol): ...\n",
        )
        .unwrap();
        assert_eq!(read_exports(&path).unwrap(), vec!["A", "B"]);
    }
}
