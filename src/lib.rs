//! apiscope - static analysis of Go projects.
//!
//! apiscope walks a Go source tree, extracts its declarations with
//! tree-sitter, discovers HTTP endpoints registered through common routing
//! idioms, and links declarations into a call/import dependency graph. Results
//! live in an in-memory store that supports listing, search, filtering,
//! statistics and export.
//!
//! # Architecture
//!
//! - `analysis`: source walker, Go extractor and the scan runner
//! - `endpoints`: lexical endpoint discovery (router groups, standalone patterns)
//! - `graph`: dependency graph construction
//! - `store`: concurrent, paginated project store
//! - `filter`: node filters and complexity scoring
//! - `service`: query surface used by the CLI or a transport layer
//! - `export`, `report`: output encoders, wire envelopes and terminal output
//!
//! Discovery and call resolution are heuristic: they read source text, they
//! do not type-check it.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod export;
pub mod filter;
pub mod graph;
pub mod logging;
pub mod model;
pub mod report;
pub mod service;
pub mod store;

pub use analysis::{Scanner, SourceWalker};
pub use config::{AnalysisConfig, FilterConfig, ScanLimits, Settings};
pub use endpoints::{combine, EndpointDiscoverer};
pub use error::{Error, ErrorKind, Result};
pub use filter::{complexity, FilterEngine};
pub use graph::GraphBuilder;
pub use logging::{Event, Logger, RecordingLogger, SharedLogger, TracingLogger};
pub use model::{CodeNode, Endpoint, HttpMethod, NodeKind, ProjectAnalysis};
pub use service::AnalyzerService;
pub use store::{AnalysisStore, Page, PageResult};
