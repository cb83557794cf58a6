//! Conjunctive node filtering and complexity scoring.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::FilterConfig;
use crate::model::{extension_of, CodeNode, NodeDetail, NodeKind};

/// Nodes that passed a filter.
#[derive(Debug, Clone, Serialize)]
pub struct FilterResult {
    pub nodes: Vec<CodeNode>,
    /// Number of nodes evaluated.
    pub total: usize,
    /// Number of active predicates.
    pub applied_filters: usize,
}

/// Values present in a project that are worth filtering on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSuggestions {
    pub node_types: Vec<String>,
    pub file_extensions: Vec<String>,
    pub package_names: Vec<String>,
    pub function_names: Vec<String>,
}

/// Evaluates a [`FilterConfig`] against nodes.
///
/// A node must pass every configured predicate; unset predicates always pass.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    config: FilterConfig,
    node_types: Vec<String>,
    file_extensions: Vec<String>,
    package_names: Vec<String>,
    function_names: Vec<String>,
}

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        let lower = |v: &[String]| v.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();
        let file_extensions = config
            .file_extensions
            .iter()
            .map(|e| {
                if e.starts_with('.') {
                    e.clone()
                } else {
                    format!(".{}", e)
                }
            })
            .collect();
        Self {
            node_types: lower(&config.node_types),
            package_names: lower(&config.package_names),
            function_names: lower(&config.function_names),
            file_extensions,
            config,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Number of configured predicates.
    pub fn active_predicates(&self) -> usize {
        let c = &self.config;
        [
            !c.node_types.is_empty(),
            !c.file_extensions.is_empty(),
            !c.package_names.is_empty(),
            !c.function_names.is_empty(),
            !c.blacklist_files.is_empty(),
            !c.blacklist_dirs.is_empty(),
            c.min_complexity.is_some(),
            c.max_complexity.is_some(),
        ]
        .iter()
        .filter(|&&active| active)
        .count()
    }

    pub fn matches(&self, node: &CodeNode) -> bool {
        let c = &self.config;

        if !self.node_types.is_empty() && !self.node_types.iter().any(|t| t == node.kind().as_str())
        {
            return false;
        }

        if !self.file_extensions.is_empty()
            && !self.file_extensions.contains(&extension_of(&node.file))
        {
            return false;
        }

        if !self.package_names.is_empty() {
            let package = node.package.to_lowercase();
            if !self.package_names.iter().any(|p| package.contains(p.as_str())) {
                return false;
            }
        }

        if !self.function_names.is_empty() && node.kind() == NodeKind::Function {
            let name = node.name.to_lowercase();
            if !self.function_names.iter().any(|f| name.contains(f.as_str())) {
                return false;
            }
        }

        if c
            .blacklist_files
            .iter()
            .chain(&c.blacklist_dirs)
            .any(|b| node.file.contains(b.as_str()))
        {
            return false;
        }

        if c.min_complexity.is_some() || c.max_complexity.is_some() {
            let score = complexity(node);
            if c.min_complexity.is_some_and(|min| score < min)
                || c.max_complexity.is_some_and(|max| score > max)
            {
                return false;
            }
        }

        true
    }

    /// Keep the nodes that pass, in input order.
    pub fn apply(&self, nodes: Vec<CodeNode>) -> FilterResult {
        let total = nodes.len();
        let nodes = nodes.into_iter().filter(|n| self.matches(n)).collect();
        FilterResult {
            nodes,
            total,
            applied_filters: self.active_predicates(),
        }
    }

    /// Distinct kinds, extensions, packages and function names, in first-seen order.
    pub fn suggestions(nodes: &[CodeNode]) -> FilterSuggestions {
        let mut seen = BTreeSet::new();
        let mut out = FilterSuggestions::default();
        for node in nodes {
            let kind = node.kind().as_str();
            if seen.insert(("kind", kind.to_string())) {
                out.node_types.push(kind.to_string());
            }
            let ext = extension_of(&node.file);
            if !ext.is_empty() && seen.insert(("ext", ext.clone())) {
                out.file_extensions.push(ext);
            }
            if !node.package.is_empty() && seen.insert(("pkg", node.package.clone())) {
                out.package_names.push(node.package.clone());
            }
            if node.kind() == NodeKind::Function && seen.insert(("fn", node.name.clone())) {
                out.function_names.push(node.name.clone());
            }
        }
        out
    }
}

/// Complexity score of a node.
///
/// An explicit score wins. Otherwise the body line count is scaled by kind:
/// doubled for functions, times `fields * 3` for structs, times `methods * 2`
/// for interfaces. An empty struct or interface scores zero.
pub fn complexity(node: &CodeNode) -> i64 {
    if let Some(explicit) = node.complexity {
        return explicit;
    }
    let lines = node.body.split('\n').count() as i64;
    match &node.detail {
        NodeDetail::Function { .. } => lines * 2,
        NodeDetail::Struct { fields } => lines * fields.len() as i64 * 3,
        NodeDetail::Interface { methods } => lines * methods.len() as i64 * 2,
        _ => lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, InterfaceMethod};

    fn node(name: &str, file: &str, package: &str, body: &str, detail: NodeDetail) -> CodeNode {
        CodeNode {
            id: name.into(),
            graph_id: String::new(),
            name: name.into(),
            file: file.into(),
            package: package.into(),
            body: body.into(),
            position: None,
            complexity: None,
            detail,
        }
    }

    fn function(name: &str, lines: usize) -> CodeNode {
        node(
            name,
            "api/handlers.go",
            "api",
            &vec!["x"; lines].join("\n"),
            NodeDetail::Function {
                receiver: None,
                is_method: false,
                parameters: vec![],
                returns: vec![],
                calls_to: vec![],
                used_types: vec![],
            },
        )
    }

    fn field(name: &str) -> Field {
        Field {
            name: name.into(),
            type_name: "string".into(),
            tag: None,
            embedded: false,
        }
    }

    #[test]
    fn test_complexity_heuristic() {
        assert_eq!(complexity(&function("F", 3)), 6);

        let user = node(
            "User",
            "m.go",
            "m",
            "type User struct {\n\tID string\n\tName string\n}",
            NodeDetail::Struct {
                fields: vec![field("ID"), field("Name")],
            },
        );
        assert_eq!(complexity(&user), 4 * 2 * 3);

        let empty = node("E", "m.go", "m", "type E struct{}", NodeDetail::Struct { fields: vec![] });
        assert_eq!(complexity(&empty), 0);

        let marker = node("M", "m.go", "m", "type M interface{}", NodeDetail::Interface {
            methods: vec![],
        });
        assert_eq!(complexity(&marker), 0);

        let iface = node(
            "Repo",
            "m.go",
            "m",
            "type Repo interface {\n\tGet()\n}",
            NodeDetail::Interface {
                methods: vec![InterfaceMethod {
                    name: "Get".into(),
                    parameters: vec![],
                    returns: vec![],
                }],
            },
        );
        assert_eq!(complexity(&iface), 3 * 2);

        let mut explicit = function("G", 100);
        explicit.complexity = Some(7);
        assert_eq!(complexity(&explicit), 7);
    }

    #[test]
    fn test_kind_and_min_complexity_conjunction() {
        let engine = FilterEngine::new(FilterConfig {
            node_types: vec!["function".into()],
            min_complexity: Some(10),
            ..Default::default()
        });
        let nodes = vec![
            function("Small", 2),
            function("Large", 8),
            node(
                "Big",
                "m.go",
                "m",
                &vec!["x"; 50].join("\n"),
                NodeDetail::Struct {
                    fields: vec![field("A")],
                },
            ),
        ];

        let result = engine.apply(nodes);
        let names: Vec<_> = result.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Large"]);
        assert_eq!(result.total, 3);
        assert_eq!(result.applied_filters, 2);
    }

    #[test]
    fn test_package_function_and_blacklist_predicates() {
        let mut other = node("Config", "cmd/main.go", "Main", "", NodeDetail::Type {
            type_definition: "string".into(),
        });
        other.package = "MainPkg".into();

        let engine = FilterEngine::new(FilterConfig {
            package_names: vec!["mainpkg".into()],
            function_names: vec!["Handle".into()],
            ..Default::default()
        });
        // Function-name predicate does not apply to non-function nodes.
        assert!(engine.matches(&other));
        assert!(!engine.matches(&function("HandleUser", 1)));

        let engine = FilterEngine::new(FilterConfig {
            function_names: vec!["Handle".into()],
            blacklist_dirs: vec!["internal/".into()],
            file_extensions: vec!["go".into()],
            ..Default::default()
        });
        assert!(engine.matches(&function("HandleUser", 1)));
        assert!(!engine.matches(&function("List", 1)));
        let mut hidden = function("HandleX", 1);
        hidden.file = "internal/x.go".into();
        assert!(!engine.matches(&hidden));
        assert_eq!(engine.active_predicates(), 3);
    }

    #[test]
    fn test_function_name_ignores_case() {
        let engine = FilterEngine::new(FilterConfig {
            function_names: vec!["getuser".into()],
            ..Default::default()
        });
        assert!(engine.matches(&function("GetUser", 1)));
        assert!(engine.matches(&function("handleGETUSERById", 1)));
        assert!(!engine.matches(&function("ListUsers", 1)));

        let engine = FilterEngine::new(FilterConfig {
            function_names: vec!["LIST".into()],
            ..Default::default()
        });
        assert!(engine.matches(&function("ListUsers", 1)));
    }

    #[test]
    fn test_suggestions_are_distinct() {
        let nodes = vec![
            function("A", 1),
            function("A", 1),
            node("T", "m/t.go", "m", "", NodeDetail::Type {
                type_definition: "int".into(),
            }),
        ];
        let s = FilterEngine::suggestions(&nodes);
        assert_eq!(s.node_types, vec!["function", "type"]);
        assert_eq!(s.file_extensions, vec![".go"]);
        assert_eq!(s.package_names, vec!["api", "m"]);
        assert_eq!(s.function_names, vec!["A"]);
    }
}
