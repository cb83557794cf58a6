//! Queryable projection of extracted declarations.

use serde::Serialize;
use std::fmt;

use super::source::{Field, InterfaceMethod, Parameter, Position};

/// Kind of a [`CodeNode`] and of a dependency-graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Function,
    Struct,
    Interface,
    Type,
    Variable,
    Constant,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Function,
        NodeKind::Struct,
        NodeKind::Interface,
        NodeKind::Type,
        NodeKind::Variable,
        NodeKind::Constant,
    ];

    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Function => "function",
            NodeKind::Struct => "struct",
            NodeKind::Interface => "interface",
            NodeKind::Type => "type",
            NodeKind::Variable => "variable",
            NodeKind::Constant => "constant",
        }
    }

    /// Parse from a string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(NodeKind::Function),
            "struct" => Some(NodeKind::Struct),
            "interface" => Some(NodeKind::Interface),
            "type" => Some(NodeKind::Type),
            "variable" => Some(NodeKind::Variable),
            "constant" => Some(NodeKind::Constant),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific payload of a [`CodeNode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "metadata", rename_all = "lowercase")]
pub enum NodeDetail {
    Function {
        #[serde(skip_serializing_if = "Option::is_none")]
        receiver: Option<String>,
        is_method: bool,
        parameters: Vec<Parameter>,
        returns: Vec<Parameter>,
        calls_to: Vec<String>,
        used_types: Vec<String>,
    },
    Struct {
        fields: Vec<Field>,
    },
    Interface {
        methods: Vec<InterfaceMethod>,
    },
    Type {
        type_definition: String,
    },
    Variable {
        var_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Constant {
        const_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

impl NodeDetail {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeDetail::Function { .. } => NodeKind::Function,
            NodeDetail::Struct { .. } => NodeKind::Struct,
            NodeDetail::Interface { .. } => NodeKind::Interface,
            NodeDetail::Type { .. } => NodeKind::Type,
            NodeDetail::Variable { .. } => NodeKind::Variable,
            NodeDetail::Constant { .. } => NodeKind::Constant,
        }
    }
}

/// One extracted declaration, flattened for listing, search and filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeNode {
    /// Opaque id assigned by the store.
    pub id: String,
    /// Deterministic `package.name.kind` identity, shared with the dependency graph.
    pub graph_id: String,
    pub name: String,
    pub file: String,
    pub package: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Explicit complexity score, overriding the heuristic when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<i64>,
    #[serde(flatten)]
    pub detail: NodeDetail,
}

impl CodeNode {
    pub fn kind(&self) -> NodeKind {
        self.detail.kind()
    }
}

/// Canonical identity of a declaration: `package.name.kind`.
pub fn graph_id(package: &str, name: &str, kind: NodeKind) -> String {
    format!("{}.{}.{}", package, name, kind.as_str())
}
