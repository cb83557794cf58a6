//! Go source extractor using tree-sitter.
//!
//! Extracts:
//! - Package clause and imports
//! - Functions and methods (receiver, parameters, returns)
//! - Every call expression and composite-literal type inside function bodies
//! - Structs (fields, tags, embedding), interfaces and other named types
//! - Package-level variables and constants

use std::path::Path;

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{ParsedFile, SourceExtractor};
use crate::model::{
    Binding, Call, Field, FileRecord, Function, Interface, InterfaceMethod, Parameter, Position,
    Struct, TypeDecl,
};

/// Call sites and composite literals inside a function body.
const BODY_USAGE_QUERY: &str = r#"
[
  (call_expression) @call
  (composite_literal) @literal
]
"#;

/// Go source extractor.
pub struct GoExtractor {
    language: Language,
    usage_query: OnceCell<Query>,
}

impl GoExtractor {
    /// Create a new Go extractor.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
            usage_query: OnceCell::new(),
        }
    }

    /// Body usage query, compiled on first use.
    fn usage_query(&self) -> anyhow::Result<&Query> {
        let query = self
            .usage_query
            .get_or_try_init(|| Query::new(&self.language, BODY_USAGE_QUERY))?;
        Ok(query)
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Extract the package name from the package clause.
    fn extract_package(&self, parsed: &ParsedFile, root: Node) -> Option<String> {
        named_children(root)
            .into_iter()
            .find(|n| n.kind() == "package_clause")
            .and_then(|clause| {
                named_children(clause)
                    .into_iter()
                    .find(|n| n.kind() == "package_identifier")
            })
            .map(|ident| parsed.node_text(ident).to_string())
    }

    /// Collect import paths from an import declaration.
    fn extract_imports(&self, parsed: &ParsedFile, decl: Node, imports: &mut Vec<String>) {
        for child in named_children(decl) {
            match child.kind() {
                "import_spec" => {
                    if let Some(path) = child.child_by_field_name("path") {
                        let path = trim_literal(parsed.node_text(path));
                        if !path.is_empty() {
                            imports.push(path.to_string());
                        }
                    }
                }
                "import_spec_list" => self.extract_imports(parsed, child, imports),
                _ => {}
            }
        }
    }

    /// Extract a function or method declaration.
    fn extract_function(&self, parsed: &ParsedFile, usage: &Query, node: Node) -> Function {
        let name = node
            .child_by_field_name("name")
            .map(|n| parsed.node_text(n).to_string())
            .unwrap_or_default();

        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|list| {
                named_children(list)
                    .into_iter()
                    .find(|n| n.kind() == "parameter_declaration")
            })
            .and_then(|param| param.child_by_field_name("type"))
            .map(|ty| expr_to_string(parsed, ty));

        let mut function = Function {
            name,
            is_method: receiver.is_some(),
            receiver,
            parameters: self.extract_parameters(parsed, node.child_by_field_name("parameters")),
            returns: self.extract_results(parsed, node.child_by_field_name("result")),
            body: parsed.node_text(node).to_string(),
            position: Position::from_node(node),
            calls: Vec::new(),
            used_types: Vec::new(),
        };

        if let Some(body) = node.child_by_field_name("body") {
            self.collect_body_usage(parsed, usage, body, &mut function);
        }

        function
    }

    /// Expand a parameter list, one entry per declared name.
    fn extract_parameters(&self, parsed: &ParsedFile, list: Option<Node>) -> Vec<Parameter> {
        let Some(list) = list else {
            return Vec::new();
        };

        let mut params = Vec::new();
        for decl in named_children(list) {
            let type_name = match decl.kind() {
                "parameter_declaration" => decl
                    .child_by_field_name("type")
                    .map(|t| expr_to_string(parsed, t))
                    .unwrap_or_default(),
                "variadic_parameter_declaration" => decl
                    .child_by_field_name("type")
                    .map(|t| format!("...{}", expr_to_string(parsed, t)))
                    .unwrap_or_default(),
                _ => continue,
            };

            let names = field_children(decl, "name");
            if names.is_empty() {
                params.push(Parameter {
                    name: String::new(),
                    type_name,
                });
            } else {
                for name in names {
                    params.push(Parameter {
                        name: parsed.node_text(name).to_string(),
                        type_name: type_name.clone(),
                    });
                }
            }
        }
        params
    }

    /// Result is either a parameter list or a single bare type.
    fn extract_results(&self, parsed: &ParsedFile, result: Option<Node>) -> Vec<Parameter> {
        match result {
            None => Vec::new(),
            Some(node) if node.kind() == "parameter_list" => {
                self.extract_parameters(parsed, Some(node))
            }
            Some(node) => vec![Parameter {
                name: String::new(),
                type_name: expr_to_string(parsed, node),
            }],
        }
    }

    /// Record every call expression and composite-literal type under `body`.
    ///
    /// Query matches arrive in document order, so outer calls precede the
    /// calls nested in their arguments.
    fn collect_body_usage(
        &self,
        parsed: &ParsedFile,
        query: &Query,
        body: Node,
        function: &mut Function,
    ) {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, body, parsed.source.as_slice());

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                match query.capture_names()[capture.index as usize] {
                    "call" => {
                        let name = node
                            .child_by_field_name("function")
                            .map(|f| expr_to_string(parsed, f))
                            .unwrap_or_default();
                        let arguments = node
                            .child_by_field_name("arguments")
                            .map(|args| {
                                named_children(args)
                                    .into_iter()
                                    .filter(|a| a.kind() != "comment")
                                    .map(|a| expr_to_string(parsed, a))
                                    .collect()
                            })
                            .unwrap_or_default();
                        function.calls.push(Call {
                            name,
                            arguments,
                            position: Position::from_node(node),
                        });
                    }
                    "literal" => {
                        if let Some(ty) = node.child_by_field_name("type") {
                            let type_name = expr_to_string(parsed, ty);
                            if !function.used_types.contains(&type_name) {
                                function.used_types.push(type_name);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Extract the specs of a `type` declaration into the record.
    fn extract_type_declaration(&self, parsed: &ParsedFile, decl: Node, record: &mut FileRecord) {
        let specs: Vec<Node> = named_children(decl)
            .into_iter()
            .filter(|n| matches!(n.kind(), "type_spec" | "type_alias"))
            .collect();
        let grouped = specs.len() != 1;

        for spec in specs {
            let Some(name) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = parsed.node_text(name).to_string();
            let text_node = if grouped { spec } else { decl };
            let body = parsed.node_text(text_node).to_string();
            let position = Position::from_node(text_node);

            let Some(ty) = spec.child_by_field_name("type") else {
                continue;
            };

            match ty.kind() {
                "struct_type" if spec.kind() == "type_spec" => record.structs.push(Struct {
                    name,
                    fields: self.extract_fields(parsed, ty),
                    body,
                    position,
                }),
                "interface_type" if spec.kind() == "type_spec" => {
                    record.interfaces.push(Interface {
                        name,
                        methods: self.extract_interface_methods(parsed, ty),
                        body,
                        position,
                    })
                }
                _ => record.types.push(TypeDecl {
                    name,
                    type_name: expr_to_string(parsed, ty),
                    body,
                    position,
                }),
            }
        }
    }

    fn extract_fields(&self, parsed: &ParsedFile, struct_type: Node) -> Vec<Field> {
        let Some(list) = named_children(struct_type)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return Vec::new();
        };

        let mut fields = Vec::new();
        for decl in named_children(list) {
            if decl.kind() != "field_declaration" {
                continue;
            }

            let mut type_name = decl
                .child_by_field_name("type")
                .map(|t| expr_to_string(parsed, t))
                .unwrap_or_default();
            let tag = decl
                .child_by_field_name("tag")
                .map(|t| trim_literal(parsed.node_text(t)).to_string());
            let names = field_children(decl, "name");

            if names.is_empty() {
                // Embedded field; a pointer embed carries a bare `*` token.
                let mut cursor = decl.walk();
                let is_pointer = decl.children(&mut cursor).any(|c| c.kind() == "*");
                if is_pointer && !type_name.starts_with('*') {
                    type_name = format!("*{}", type_name);
                }
                fields.push(Field {
                    name: String::new(),
                    type_name,
                    tag,
                    embedded: true,
                });
                continue;
            }

            for name in names {
                fields.push(Field {
                    name: parsed.node_text(name).to_string(),
                    type_name: type_name.clone(),
                    tag: tag.clone(),
                    embedded: false,
                });
            }
        }
        fields
    }

    fn extract_interface_methods(&self, parsed: &ParsedFile, iface: Node) -> Vec<InterfaceMethod> {
        named_children(iface)
            .into_iter()
            .filter(|n| matches!(n.kind(), "method_elem" | "method_spec"))
            .filter_map(|method| {
                let name = method.child_by_field_name("name")?;
                Some(InterfaceMethod {
                    name: parsed.node_text(name).to_string(),
                    parameters: self
                        .extract_parameters(parsed, method.child_by_field_name("parameters")),
                    returns: self.extract_results(parsed, method.child_by_field_name("result")),
                })
            })
            .collect()
    }

    /// Extract `var` or `const` bindings, one per declared name.
    fn extract_bindings(&self, parsed: &ParsedFile, decl: Node) -> Vec<Binding> {
        let mut specs = Vec::new();
        for child in named_children(decl) {
            match child.kind() {
                "var_spec" | "const_spec" => specs.push(child),
                "var_spec_list" => specs.extend(
                    named_children(child)
                        .into_iter()
                        .filter(|n| n.kind() == "var_spec"),
                ),
                _ => {}
            }
        }
        let grouped = specs.len() != 1;

        let mut bindings = Vec::new();
        for spec in specs {
            let text_node = if grouped { spec } else { decl };
            let body = parsed.node_text(text_node).to_string();
            let type_name = spec
                .child_by_field_name("type")
                .map(|t| expr_to_string(parsed, t))
                .unwrap_or_default();
            let values: Vec<Node> = spec
                .child_by_field_name("value")
                .map(|list| {
                    named_children(list)
                        .into_iter()
                        .filter(|n| n.kind() != "comment")
                        .collect()
                })
                .unwrap_or_default();

            for (i, name) in field_children(spec, "name").into_iter().enumerate() {
                bindings.push(Binding {
                    name: parsed.node_text(name).to_string(),
                    type_name: type_name.clone(),
                    value: values.get(i).map(|v| expr_to_string(parsed, *v)),
                    body: body.clone(),
                    position: Position::from_node(name),
                });
            }
        }
        bindings
    }
}

impl Default for GoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceExtractor for GoExtractor {
    fn language_id(&self) -> &'static str {
        "go"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        // Invalid UTF-8 is replaced up front so that byte offsets in the tree
        // always index into text that downstream passes can read.
        let source = String::from_utf8_lossy(source).into_owned().into_bytes();

        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse Go source: {}", path.display()))?;

        Ok(ParsedFile {
            tree,
            source,
            path: path.to_string_lossy().to_string(),
        })
    }

    fn extract(&self, parsed: &ParsedFile, relative_path: &str) -> anyhow::Result<FileRecord> {
        if let Some((line, column)) = parsed.first_error() {
            anyhow::bail!("{}:{}:{}: syntax error", relative_path, line, column);
        }

        let root = parsed.tree.root_node();
        let package = self
            .extract_package(parsed, root)
            .ok_or_else(|| anyhow::anyhow!("{}: missing package clause", relative_path))?;

        let usage = self.usage_query()?;

        let mut record = FileRecord {
            path: relative_path.to_string(),
            absolute_path: parsed.path.clone(),
            package,
            content: parsed.source_str().to_string(),
            ..Default::default()
        };

        for node in named_children(root) {
            match node.kind() {
                "import_declaration" => self.extract_imports(parsed, node, &mut record.imports),
                "function_declaration" | "method_declaration" => {
                    record.functions.push(self.extract_function(parsed, usage, node))
                }
                "type_declaration" => self.extract_type_declaration(parsed, node, &mut record),
                "var_declaration" => record.variables.extend(self.extract_bindings(parsed, node)),
                "const_declaration" => record.constants.extend(self.extract_bindings(parsed, node)),
                _ => {}
            }
        }

        Ok(record)
    }
}

/// Render a type or expression the way it reads in signatures.
///
/// Composite values are abbreviated: `User{...}`, `NewService(...)`, `func(...)`.
pub fn expr_to_string(parsed: &ParsedFile, node: Node) -> String {
    let field = |name: &str| {
        node.child_by_field_name(name)
            .map(|n| expr_to_string(parsed, n))
            .unwrap_or_default()
    };

    match node.kind() {
        "selector_expression" => format!("{}.{}", field("operand"), field("field")),
        "qualified_type" => format!("{}.{}", field("package"), field("name")),
        "pointer_type" => match node.named_child(0) {
            Some(inner) => format!("*{}", expr_to_string(parsed, inner)),
            None => parsed.node_text(node).to_string(),
        },
        "slice_type" => format!("[]{}", field("element")),
        "array_type" => format!("[{}]{}", field("length"), field("element")),
        "map_type" => format!("map[{}]{}", field("key"), field("value")),
        "channel_type" => format!("chan {}", field("value")),
        "interface_type" => "interface{}".to_string(),
        "struct_type" => "struct{...}".to_string(),
        "function_type" | "func_literal" => "func(...)".to_string(),
        "composite_literal" => format!("{}{{...}}", field("type")),
        "call_expression" => format!("{}(...)", field("function")),
        "parenthesized_type" => match node.named_child(0) {
            Some(inner) => expr_to_string(parsed, inner),
            None => parsed.node_text(node).to_string(),
        },
        _ => parsed.node_text(node).trim().to_string(),
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Strip the quotes or backticks of a string literal.
fn trim_literal(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '`')
}
