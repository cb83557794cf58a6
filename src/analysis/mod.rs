//! Source walking and syntax extraction.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ SourceWalker│────▶│ Extractors   │────▶│ FileRecords │
//! │ (policy)    │     │ (tree-sitter)│     │             │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                                                 │
//!                                                 ▼
//!                     ┌──────────────┐     ┌─────────────────┐
//!                     │ Endpoints,   │◀────│ ProjectAnalysis │
//!                     │ Graph        │     │ (Scanner)       │
//!                     └──────────────┘     └─────────────────┘
//! ```
//!
//! # Adding a New Language
//!
//! 1. Create a new module in `src/analysis/languages/`
//! 2. Implement the `SourceExtractor` trait
//! 3. Register the extractor in `languages/mod.rs`
//!
//! See `languages/go.rs` for the reference implementation.

mod languages;
mod nodes;
mod runner;
mod traits;
mod walker;

pub use languages::{expr_to_string, get_extractor, supported_extensions, GoExtractor};
pub use nodes::{code_nodes, count_by_kind};
pub use runner::Scanner;
pub use traits::{ParsedFile, SourceExtractor};
pub use walker::{SourceFile, SourceWalker};
