//! Projection of extracted declarations into [`CodeNode`]s.

use std::collections::BTreeMap;

use crate::model::{graph_id, CodeNode, FileRecord, NodeDetail, NodeKind, ProjectAnalysis};

/// One node per declaration, in file order then declaration order.
///
/// Ids are left empty for the store to assign.
pub fn code_nodes(analysis: &ProjectAnalysis) -> Vec<CodeNode> {
    let mut nodes = Vec::with_capacity(analysis.declaration_count());
    for file in analysis.files.values() {
        file_nodes(file, &mut nodes);
    }
    nodes
}

fn file_nodes(file: &FileRecord, nodes: &mut Vec<CodeNode>) {
    let node = |name: &str, body: &str, position, detail: NodeDetail| CodeNode {
        id: String::new(),
        graph_id: graph_id(&file.package, name, detail.kind()),
        name: name.to_string(),
        file: file.path.clone(),
        package: file.package.clone(),
        body: body.to_string(),
        position: Some(position),
        complexity: None,
        detail,
    };

    for f in &file.functions {
        nodes.push(node(
            &f.name,
            &f.body,
            f.position,
            NodeDetail::Function {
                receiver: f.receiver.clone(),
                is_method: f.is_method,
                parameters: f.parameters.clone(),
                returns: f.returns.clone(),
                calls_to: f.calls.iter().map(|c| c.name.clone()).collect(),
                used_types: f.used_types.clone(),
            },
        ));
    }
    for s in &file.structs {
        nodes.push(node(
            &s.name,
            &s.body,
            s.position,
            NodeDetail::Struct {
                fields: s.fields.clone(),
            },
        ));
    }
    for i in &file.interfaces {
        nodes.push(node(
            &i.name,
            &i.body,
            i.position,
            NodeDetail::Interface {
                methods: i.methods.clone(),
            },
        ));
    }
    for t in &file.types {
        nodes.push(node(
            &t.name,
            &t.body,
            t.position,
            NodeDetail::Type {
                type_definition: t.type_name.clone(),
            },
        ));
    }
    for v in &file.variables {
        nodes.push(node(
            &v.name,
            &v.body,
            v.position,
            NodeDetail::Variable {
                var_type: v.type_name.clone(),
                value: v.value.clone(),
            },
        ));
    }
    for c in &file.constants {
        nodes.push(node(
            &c.name,
            &c.body,
            c.position,
            NodeDetail::Constant {
                const_type: c.type_name.clone(),
                value: c.value.clone(),
            },
        ));
    }
}

/// Count of nodes per kind, every kind present.
pub fn count_by_kind(nodes: &[CodeNode]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = NodeKind::ALL
        .iter()
        .map(|k| (k.as_str().to_string(), 0))
        .collect();
    for node in nodes {
        *counts.entry(node.kind().as_str().to_string()).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Binding, Function, Position, Struct};

    #[test]
    fn test_one_node_per_declaration() {
        let mut analysis = ProjectAnalysis::new("/p");
        analysis.add_file(FileRecord {
            path: "svc/user.go".into(),
            package: "svc".into(),
            functions: vec![Function {
                name: "NewUser".into(),
                receiver: None,
                is_method: false,
                parameters: vec![],
                returns: vec![],
                body: "func NewUser() {}".into(),
                position: Position::default(),
                calls: vec![],
                used_types: vec!["User".into()],
            }],
            structs: vec![Struct {
                name: "User".into(),
                fields: vec![],
                body: "type User struct{}".into(),
                position: Position::default(),
            }],
            constants: vec![Binding {
                name: "Max".into(),
                type_name: String::new(),
                value: Some("3".into()),
                body: "const Max = 3".into(),
                position: Position::default(),
            }],
            ..Default::default()
        });

        let nodes = code_nodes(&analysis);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].graph_id, "svc.NewUser.function");
        assert_eq!(nodes[1].kind(), NodeKind::Struct);
        assert_eq!(nodes[2].graph_id, "svc.Max.constant");

        let counts = count_by_kind(&nodes);
        assert_eq!(counts["function"], 1);
        assert_eq!(counts["interface"], 0);
    }
}
