//! File-level entities produced by the Go extractor.

use serde::Serialize;

/// Location in a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 1-indexed line.
    pub line: usize,
    /// 1-indexed column.
    pub column: usize,
    /// 0-indexed byte offset.
    pub offset: usize,
}

impl Position {
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        Self {
            line: start.row + 1,
            column: start.column + 1,
            offset: node.start_byte(),
        }
    }
}

/// Function parameter or return value. `name` is empty when unnamed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Call expression found inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    pub name: String,
    pub arguments: Vec<String>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub is_method: bool,
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Parameter>,
    pub body: String,
    pub position: Position,
    pub calls: Vec<Call>,
    /// Composite-literal type names, deduplicated in first-seen order.
    pub used_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Field>,
    pub body: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub name: String,
    pub methods: Vec<InterfaceMethod>,
    pub body: String,
    pub position: Position,
}

/// Named type that is neither a struct nor an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub body: String,
    pub position: Position,
}

/// Package-level `var` or `const` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub name: String,
    /// Declared type, empty when inferred.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub body: String,
    pub position: Position,
}

pub type Variable = Binding;
pub type Constant = Binding;

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    pub absolute_path: String,
    pub package: String,
    #[serde(skip)]
    pub content: String,
    pub imports: Vec<String>,
    pub functions: Vec<Function>,
    pub structs: Vec<Struct>,
    pub interfaces: Vec<Interface>,
    pub types: Vec<TypeDecl>,
    pub variables: Vec<Variable>,
    pub constants: Vec<Constant>,
}

impl FileRecord {
    /// Directory part of `path`, empty for files at the root.
    pub fn package_path(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }

    /// Extension including the leading dot, or empty.
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }

    pub fn declaration_count(&self) -> usize {
        self.functions.len()
            + self.structs.len()
            + self.interfaces.len()
            + self.types.len()
            + self.variables.len()
            + self.constants.len()
    }
}

/// `.go` for `a/b.go`; empty when there is no dot in the file name.
pub fn extension_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => name[idx..].to_string(),
        None => String::new(),
    }
}

/// Files sharing one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    pub name: String,
    pub path: String,
    pub files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_path_and_extension() {
        let file = FileRecord {
            path: "internal/api/router.go".into(),
            ..Default::default()
        };
        assert_eq!(file.package_path(), "internal/api");
        assert_eq!(file.extension(), ".go");

        let root = FileRecord {
            path: "main.go".into(),
            ..Default::default()
        };
        assert_eq!(root.package_path(), "");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of("dir.v2/Makefile"), "");
    }
}
