//! Directed call/import graph between declarations.

use serde::Serialize;
use std::fmt;

use super::node::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyNode {
    /// `package.name.kind`
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub file: String,
    pub package: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Call,
    Import,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Call => "call",
            DependencyKind::Import => "import",
        }
    }

    /// Edge weight on the 1..=10 scale.
    pub fn strength(&self) -> u8 {
        match self {
            DependencyKind::Call => 5,
            DependencyKind::Import => 3,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Dependency {
    pub from: String,
    pub to: String,
    pub kind: DependencyKind,
    pub strength: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    pub nodes: Vec<DependencyNode>,
    pub dependencies: Vec<Dependency>,
}

impl DependencyGraph {
    pub fn node(&self, id: &str) -> Option<&DependencyNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges with `id` at either end.
    pub fn edges_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Dependency> + 'a {
        self.dependencies
            .iter()
            .filter(move |d| d.from == id || d.to == id)
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Dependency> + 'a {
        self.dependencies.iter().filter(move |d| d.from == id)
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Dependency> + 'a {
        self.dependencies.iter().filter(move |d| d.to == id)
    }
}
