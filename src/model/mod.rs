//! Entities produced by a scan and served by the store.

mod endpoint;
mod graph;
mod node;
mod project;
mod source;

pub use endpoint::{Endpoint, HttpMethod};
pub use graph::{Dependency, DependencyGraph, DependencyKind, DependencyNode};
pub use node::{graph_id, CodeNode, NodeDetail, NodeKind};
pub use project::{ProjectAnalysis, ScanWarning};
pub use source::{
    extension_of, Binding, Call, Constant, Field, FileRecord, Function, Interface,
    InterfaceMethod, PackageRecord, Parameter, Position, Struct, TypeDecl, Variable,
};
