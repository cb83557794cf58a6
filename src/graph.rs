//! Dependency graph construction.
//!
//! Every function, struct and interface becomes a node with the canonical id
//! `package.name.kind`. Calls are resolved lexically, first hit wins:
//!
//! 1. exact name match (same package preferred)
//! 2. `package.call.function` id match
//! 3. substring match in either direction between call name and node name
//!
//! Unresolved calls are expected and produce no edge. Imports of in-project
//! packages add weaker `import` edges.

use std::collections::{HashMap, HashSet};

use crate::model::{
    graph_id, Dependency, DependencyGraph, DependencyKind, DependencyNode, FileRecord, NodeKind,
    ProjectAnalysis,
};

/// Builds a [`DependencyGraph`] from extracted files.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphBuilder;

/// Node lookup tables for one build.
struct NodeIndex<'a> {
    nodes: &'a [DependencyNode],
    by_id: HashMap<&'a str, usize>,
    by_name: HashMap<&'a str, Vec<usize>>,
}

impl<'a> NodeIndex<'a> {
    fn new(nodes: &'a [DependencyNode]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            by_id.insert(node.id.as_str(), i);
            by_name.entry(node.name.as_str()).or_default().push(i);
        }
        Self {
            nodes,
            by_id,
            by_name,
        }
    }

    /// Resolve `call` made from `caller` in `package`.
    fn resolve(&self, call: &str, package: &str, caller: &str) -> Option<&'a DependencyNode> {
        if call.is_empty() {
            return None;
        }

        if let Some(candidates) = self.by_name.get(call) {
            let idx = candidates
                .iter()
                .find(|&&i| self.nodes[i].package == package)
                .or_else(|| candidates.first());
            if let Some(&i) = idx {
                return Some(&self.nodes[i]);
            }
        }

        let qualified = graph_id(package, call, NodeKind::Function);
        if let Some(&i) = self.by_id.get(qualified.as_str()) {
            return Some(&self.nodes[i]);
        }

        self.nodes.iter().find(|node| {
            node.id != caller
                && !node.name.is_empty()
                && (node.name.contains(call) || call.contains(node.name.as_str()))
        })
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, analysis: &ProjectAnalysis) -> DependencyGraph {
        let nodes = collect_nodes(analysis);
        let index = NodeIndex::new(&nodes);

        let mut dependencies = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |from: &str, to: &str, kind: DependencyKind| {
            if from == to || !seen.insert((from.to_string(), to.to_string(), kind)) {
                return;
            }
            dependencies.push(Dependency {
                from: from.to_string(),
                to: to.to_string(),
                kind,
                strength: kind.strength(),
            });
        };

        for file in analysis.files.values() {
            for function in &file.functions {
                let caller = graph_id(&file.package, &function.name, NodeKind::Function);
                for call in &function.calls {
                    if let Some(target) = index.resolve(&call.name, &file.package, &caller) {
                        push(&caller, &target.id, DependencyKind::Call);
                    }
                }
            }
        }

        for file in analysis.files.values() {
            for (caller, target) in import_links(file, analysis) {
                push(&caller, &target, DependencyKind::Import);
            }
        }

        DependencyGraph {
            nodes,
            dependencies,
        }
    }
}

/// One node per function, struct and interface; the first declaration of an id wins.
fn collect_nodes(analysis: &ProjectAnalysis) -> Vec<DependencyNode> {
    let mut nodes = Vec::new();
    let mut ids = HashSet::new();

    for file in analysis.files.values() {
        let declared = file
            .functions
            .iter()
            .map(|f| (f.name.as_str(), NodeKind::Function))
            .chain(file.structs.iter().map(|s| (s.name.as_str(), NodeKind::Struct)))
            .chain(
                file.interfaces
                    .iter()
                    .map(|i| (i.name.as_str(), NodeKind::Interface)),
            );

        for (name, kind) in declared {
            let id = graph_id(&file.package, name, kind);
            if !ids.insert(id.clone()) {
                continue;
            }
            nodes.push(DependencyNode {
                id,
                name: name.to_string(),
                kind,
                file: file.path.clone(),
                package: file.package.clone(),
            });
        }
    }
    nodes
}

/// `(caller, target)` pairs for calls in `file` whose name contains the name of
/// a function declared in an imported in-project package.
fn import_links(file: &FileRecord, analysis: &ProjectAnalysis) -> Vec<(String, String)> {
    let mut links = Vec::new();

    for import in &file.imports {
        let Some(package) = analysis.packages.values().find(|p| {
            !p.path.is_empty() && (import == &p.path || import.ends_with(&format!("/{}", p.path)))
        }) else {
            continue;
        };

        let targets: Vec<(&str, String)> = package
            .files
            .iter()
            .filter_map(|path| analysis.files.get(path))
            .flat_map(|f| {
                f.functions
                    .iter()
                    .map(move |func| (func.name.as_str(), graph_id(&f.package, &func.name, NodeKind::Function)))
            })
            .collect();
        if targets.is_empty() {
            continue;
        }

        for function in &file.functions {
            let caller = graph_id(&file.package, &function.name, NodeKind::Function);
            for call in &function.calls {
                for (name, target) in &targets {
                    if !name.is_empty() && call.name.contains(name) {
                        links.push((caller.clone(), target.clone()));
                    }
                }
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Call, Function, Position, Struct};

    fn function(name: &str, calls: &[&str]) -> Function {
        Function {
            name: name.into(),
            receiver: None,
            is_method: false,
            parameters: vec![],
            returns: vec![],
            body: String::new(),
            position: Position::default(),
            calls: calls
                .iter()
                .map(|c| Call {
                    name: c.to_string(),
                    arguments: vec![],
                    position: Position::default(),
                })
                .collect(),
            used_types: vec![],
        }
    }

    fn file(path: &str, package: &str, functions: Vec<Function>) -> FileRecord {
        FileRecord {
            path: path.into(),
            package: package.into(),
            functions,
            ..Default::default()
        }
    }

    #[test]
    fn test_call_edge_and_unresolved_call() {
        let mut analysis = ProjectAnalysis::new("/p");
        analysis.add_file(file(
            "bar/bar.go",
            "bar",
            vec![function("Foo", &["Baz", "zzz_unknown"]), function("Baz", &[])],
        ));

        let graph = GraphBuilder::new().build(&analysis);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.dependencies.len(), 1);
        let edge = &graph.dependencies[0];
        assert_eq!(edge.from, "bar.Foo.function");
        assert_eq!(edge.to, "bar.Baz.function");
        assert_eq!(edge.kind, DependencyKind::Call);
        assert_eq!(edge.strength, 5);
    }

    #[test]
    fn test_exact_match_prefers_same_package() {
        let mut analysis = ProjectAnalysis::new("/p");
        analysis.add_file(file("a/a.go", "a", vec![function("Run", &[])]));
        analysis.add_file(file("b/b.go", "b", vec![function("Run", &[]), function("Main", &["Run"])]));

        let graph = GraphBuilder::new().build(&analysis);
        assert_eq!(graph.dependencies.len(), 1);
        assert_eq!(graph.dependencies[0].to, "b.Run.function");
    }

    #[test]
    fn test_substring_match_and_self_edges() {
        let mut analysis = ProjectAnalysis::new("/p");
        let mut api = file(
            "api/h.go",
            "api",
            vec![function("GetUser", &["h.svc.GetUser", "GetUser"])],
        );
        api.structs.push(Struct {
            name: "Handler".into(),
            fields: vec![],
            body: String::new(),
            position: Position::default(),
        });
        analysis.add_file(api);
        analysis.add_file(file("svc/s.go", "svc", vec![function("FetchUser", &[])]));
        analysis.add_file(file("svc/t.go", "svc", vec![function("GetUser", &[])]));

        let graph = GraphBuilder::new().build(&analysis);
        assert_eq!(graph.nodes.len(), 4);
        // `h.svc.GetUser` skips the caller itself and lands on svc.GetUser;
        // the recursive `GetUser` call resolves to the caller and is dropped.
        let edges: Vec<_> = graph
            .dependencies
            .iter()
            .map(|d| (d.from.as_str(), d.to.as_str()))
            .collect();
        assert_eq!(edges, vec![("api.GetUser.function", "svc.GetUser.function")]);
    }

    #[test]
    fn test_import_edges() {
        let mut analysis = ProjectAnalysis::new("/p");
        let mut main = file(
            "main.go",
            "main",
            vec![function("main", &["service.NewUserService", "fmt.Println"])],
        );
        main.imports = vec!["fmt".into(), "example.com/app/internal/service".into()];
        analysis.add_file(main);
        analysis.add_file(file(
            "internal/service/user.go",
            "service",
            vec![function("NewUserService", &[])],
        ));

        let graph = GraphBuilder::new().build(&analysis);
        let kinds: Vec<_> = graph
            .dependencies
            .iter()
            .map(|d| (d.kind, d.to.as_str(), d.strength))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (DependencyKind::Call, "service.NewUserService.function", 5),
                (DependencyKind::Import, "service.NewUserService.function", 3),
            ]
        );
    }
}
